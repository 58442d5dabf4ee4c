//! crates/go_tany_core/src/catalog.rs
//!
//! The bundled disease catalog and the read interface over both catalog sources.

use std::sync::{Arc, LazyLock};

use crate::domain::{DiseaseId, DiseaseRecord, Tag};
use crate::filter::matches_search;
use crate::ports::{DocumentStore, PortResult};

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn tags(items: &[(&str, &str)]) -> Vec<Tag> {
    items
        .iter()
        .map(|(icon, label)| Tag {
            icon: icon.to_string(),
            label: label.to_string(),
        })
        .collect()
}

const FUNGUS: (&str, &str) = ("fas fa-bug", "Jamur");
const FUNGUS_VIRUS_ICON: (&str, &str) = ("fas fa-virus", "Jamur");
const FUNGUS_BACTERIA_ICON: (&str, &str) = ("fas fa-bacteria", "Jamur");
const ROT: (&str, &str) = ("fas fa-bug", "Pembusukan");
const DANGEROUS: (&str, &str) = ("fas fa-exclamation-triangle", "Berbahaya");
const RISKY: (&str, &str) = ("fas fa-exclamation-triangle", "Beresiko");

#[allow(clippy::too_many_arguments)]
fn entry(
    id: DiseaseId,
    title: &str,
    disease_type: &str,
    plant: &str,
    image: &str,
    description: &str,
    symptoms: &[&str],
    prevention: &[&str],
    treatment: &[&str],
    labels: &[(&str, &str)],
) -> DiseaseRecord {
    DiseaseRecord {
        id,
        title: title.to_string(),
        disease_type: disease_type.to_string(),
        plant: plant.to_string(),
        image: image.to_string(),
        description: description.to_string(),
        symptoms: list(symptoms),
        prevention: list(prevention),
        treatment: list(treatment),
        severity: None,
        tags: tags(labels),
    }
}

static CATALOG: LazyLock<Vec<DiseaseRecord>> = LazyLock::new(|| {
    vec![
        entry(
            1,
            "Anthracnose pada Apple",
            "Anthracnose",
            "apple",
            "https://s3-us-west-2.amazonaws.com/treefruit.wsu.edu/wp-content/uploads/2016/06/Bulls-eye-rot.jpg",
            "Penyakit Anthracnose pada apel disebabkan oleh jamur yang dapat merusak buah dan menyebabkan pembusukan.",
            &["Bercak coklat pada buah", "Pembusukan melingkar", "Spora berwarna pink pada kondisi lembab"],
            &["Sanitasi kebun", "Pemangkasan ranting yang terinfeksi", "Penyemprotan fungisida"],
            &["Fungisida berbahan aktif mancozeb", "Pengendalian kelembaban"],
            &[FUNGUS, DANGEROUS],
        ),
        entry(
            2,
            "Alternaria pada Guava",
            "Alternaria",
            "guava",
            "https://upload.wikimedia.org/wikipedia/commons/d/da/Cephaleuros_parasiticus.jpg",
            "Alternaria pada jambu biji menyebabkan bercak daun dan busuk buah.",
            &["Bercak hitam pada daun", "Buah membusuk dari ujung", "Daun rontok"],
            &["Jaga kebersihan kebun", "Hindari kelembaban tinggi", "Jarak tanam yang cukup"],
            &["Fungisida tembaga", "Pemangkasan"],
            &[FUNGUS_VIRUS_ICON, DANGEROUS],
        ),
        entry(
            3,
            "Rot pada Mango",
            "Rot",
            "mango",
            "https://thumbs.dreamstime.com/b/mango-fruit-mold-mould-one-structures-certain-fungi-can-form-formation-spores-containing-fungal-secondary-302115966.jpg",
            "Pembusukan pada mangga sering terjadi pasca panen atau saat buah matang di pohon.",
            &["Daging buah lunak dan berair", "Bau busuk", "Kulit buah menghitam"],
            &["Panen hati-hati", "Penyimpanan dingin", "Perlakuan air panas"],
            &["Tidak ada obat untuk buah yang sudah busuk", "Cegah penyebaran ke buah lain"],
            &[ROT, RISKY],
        ),
        entry(
            4,
            "Anthracnose pada Pomegranate",
            "Anthracnose",
            "pomegranate",
            "https://content.peat-cloud.com/w400/anthracnose-of-pomegranate-pomegranate-1665753930.jpg",
            "Anthracnose pada delima menyebabkan bercak hitam pada kulit buah dan biji membusuk.",
            &["Bercak hitam keras pada kulit", "Biji membusuk", "Buah pecah"],
            &["Bersihkan sisa tanaman", "Semprot fungisida saat berbunga"],
            &["Fungisida sistemik"],
            &[FUNGUS_VIRUS_ICON, DANGEROUS],
        ),
        entry(
            5,
            "Alternaria pada Apple",
            "Alternaria",
            "apple",
            "https://bugwoodcloud.org/images/384x256/5524192.jpg",
            "Bercak daun Alternaria pada apel dapat menyebabkan defoliasi dini.",
            &["Bercak bulat pada daun", "Tengah bercak berwarna coklat", "Daun menguning"],
            &["Pengelolaan residu tanaman", "Fungisida protektif"],
            &["Fungisida Iprodione"],
            &[FUNGUS_BACTERIA_ICON, DANGEROUS],
        ),
        entry(
            6,
            "Rot pada Guava",
            "Rot",
            "guava",
            "https://www.shutterstock.com/image-photo/guava-fruit-rot-fly-infestation-260nw-1034569393.jpg",
            "Pembusukan buah jambu biji sering disebabkan oleh lalat buah atau jamur.",
            &["Buah lunak", "Ada belatung (jika lalat buah)", "Bau fermentasi"],
            &["Pembungkusan buah", "Perangkap lalat buah"],
            &["Kumpulkan dan musnahkan buah busuk"],
            &[ROT, RISKY],
        ),
        entry(
            7,
            "Anthracnose pada Mango",
            "Anthracnose",
            "mango",
            "https://gdm.id/wp-content/uploads/2023/11/penyakit-antraknosa-pada-mangga-1-300x200.jpg",
            "Penyakit utama pada mangga, menyebabkan bercak hitam pada daun, bunga, dan buah.",
            &["Bercak hitam pada daun", "Bunga rontok", "Tear stain pada buah"],
            &["Pemangkasan tajuk", "Sanitasi"],
            &["Fungisida Azoxystrobin"],
            &[FUNGUS, DANGEROUS],
        ),
        entry(
            8,
            "Alternaria pada Pomegranate",
            "Alternaria",
            "pomegranate",
            "https://us-central1-plantix-8e0ce.cloudfunctions.net/v1/image/w400/e0c91b70-f377-46e1-b446-e5668b4941b3",
            "Menyebabkan busuk hati pada buah delima.",
            &["Bagian dalam buah membusuk", "Kulit luar tampak sehat atau sedikit berubah warna"],
            &["Hindari kelembaban tinggi saat berbunga"],
            &["Sulit diobati setelah infeksi masuk"],
            &[FUNGUS, DANGEROUS],
        ),
        entry(
            9,
            "Rot pada Apple",
            "Rot",
            "apple",
            "https://upload.wikimedia.org/wikipedia/commons/thumb/7/7f/Bitter_rot_on_a_Honeycrisp_apple.jpg/500px-Bitter_rot_on_a_Honeycrisp_apple.jpg",
            "Bitter rot pada apel.",
            &["Bercak busuk cekung", "Rasa pahit pada bagian busuk"],
            &["Kalsium spray", "Sanitasi"],
            &["Fungisida Captan"],
            &[ROT, RISKY],
        ),
        entry(
            10,
            "Anthracnose pada Guava",
            "Anthracnose",
            "guava",
            "https://content.peat-cloud.com/w400/anthracnose-guava-1665755294.jpg",
            "Menyebabkan bercak nekrotik pada daun dan buah jambu.",
            &["Bercak kering pada daun", "Buah mengkerut"],
            &["Sanitasi"],
            &["Fungisida"],
            &[FUNGUS, DANGEROUS],
        ),
        entry(
            11,
            "Alternaria pada Mango",
            "Alternaria",
            "mango",
            "https://content.peat-cloud.com/w400/bacterial-black-spot-of-mango-1552661367.jpg",
            "Bercak daun dan buah pada mangga.",
            &["Bercak hitam kecil", "Daun menguning"],
            &["Jaga kesehatan tanaman"],
            &["Fungisida"],
            &[FUNGUS, DANGEROUS],
        ),
        entry(
            12,
            "Rot pada Pomegranate",
            "Rot",
            "pomegranate",
            "https://cdn.pixabay.com/photo/2022/01/15/17/01/pomegranate-6940145_960_720.jpg",
            "Pembusukan buah delima.",
            &["Buah lunak", "Berjamur"],
            &["Panen tepat waktu"],
            &["-"],
            &[ROT, RISKY],
        ),
    ]
});

/// The bundled catalog, in display order.
pub fn catalog() -> &'static [DiseaseRecord] {
    &CATALOG
}

/// Exact-match lookup on the bundled catalog. `None` is the "not found" view state.
pub fn get_disease_by_id(id: DiseaseId) -> Option<&'static DiseaseRecord> {
    CATALOG.iter().find(|d| d.id == id)
}

/// Lookup from a raw route segment such as the `:id` of `/detail/:id`. The segment
/// must be a whole integer; `"3abc"` is not found.
pub fn get_disease_by_param(raw: &str) -> Option<&'static DiseaseRecord> {
    raw.trim().parse::<DiseaseId>().ok().and_then(get_disease_by_id)
}

/// One read interface over the two independent catalog sources.
///
/// The bundled list and the remote collection are never merged or deduplicated;
/// ids are only meaningful within their own source.
#[derive(Clone)]
pub enum CatalogSource {
    Static,
    Remote(Arc<dyn DocumentStore>),
}

impl CatalogSource {
    pub async fn all(&self) -> PortResult<Vec<DiseaseRecord>> {
        match self {
            CatalogSource::Static => Ok(catalog().to_vec()),
            CatalogSource::Remote(store) => store.list_diseases().await,
        }
    }

    pub async fn by_id(&self, id: DiseaseId) -> PortResult<Option<DiseaseRecord>> {
        match self {
            CatalogSource::Static => Ok(get_disease_by_id(id).cloned()),
            CatalogSource::Remote(store) => store.get_disease(id).await,
        }
    }

    pub async fn by_type(&self, disease_type: &str) -> PortResult<Vec<DiseaseRecord>> {
        match self {
            CatalogSource::Static => Ok(catalog()
                .iter()
                .filter(|d| d.disease_type == disease_type)
                .cloned()
                .collect()),
            CatalogSource::Remote(store) => store.diseases_by_type(disease_type).await,
        }
    }

    pub async fn by_plant(&self, plant: &str) -> PortResult<Vec<DiseaseRecord>> {
        match self {
            CatalogSource::Static => Ok(catalog()
                .iter()
                .filter(|d| d.plant == plant)
                .cloned()
                .collect()),
            CatalogSource::Remote(store) => store.diseases_by_plant(plant).await,
        }
    }

    /// Fetches everything and keeps entries whose title, plant or type contains `term`.
    pub async fn search(&self, term: &str) -> PortResult<Vec<DiseaseRecord>> {
        let all = self.all().await?;
        Ok(all.into_iter().filter(|d| matches_search(d, term)).collect())
    }
}
