//! crates/go_tany_core/src/seed.rs
//!
//! Initial documents for the remote disease collection.

use tracing::info;

use crate::domain::{DiseaseRecord, Tag};
use crate::ports::{DocumentStore, PortResult};

struct Seed {
    title: &'static str,
    disease_type: &'static str,
    plant: &'static str,
    image: &'static str,
    description: &'static str,
    symptoms: [&'static str; 3],
    prevention: [&'static str; 3],
    treatment: [&'static str; 3],
    severity: &'static str,
    tags: &'static [&'static str],
}

const SEEDS: [Seed; 8] = [
    Seed {
        title: "Ulat Penggulung Daun Kapas",
        disease_type: "Serangga",
        plant: "Kapas",
        image: "https://www.vegetables.cornell.edu/files/2020/11/Scab-fruit.jpg",
        description: "Ulat penggulung daun kapas adalah hama yang menyerang tanaman kapas dengan cara menggulung daun dan memakan jaringan daun dari dalam.",
        symptoms: ["Daun menggulung", "Lubang pada daun", "Pertumbuhan terhambat"],
        prevention: ["Rotasi tanaman", "Penggunaan insektisida alami", "Pemasangan perangkap feromon"],
        treatment: ["Aplikasi insektisida sistemik", "Pemangkasan daun terinfeksi", "Pengendalian hayati dengan predator alami"],
        severity: "Tinggi",
        tags: &["Serangga", "Kapas", "Berbahaya"],
    },
    Seed {
        title: "Antraknosa pada Kedelai",
        disease_type: "Jamur",
        plant: "Kedelai",
        image: "https://www.vegetables.cornell.edu/files/2020/11/Phytophthora-blight-fruit-1024x768.jpg",
        description: "Antraknosa adalah penyakit jamur yang menyebabkan bercak coklat kehitaman pada daun, batang, dan polong kedelai.",
        symptoms: ["Bercak coklat pada daun", "Lesi pada batang", "Polong busuk"],
        prevention: ["Gunakan benih bersertifikat", "Jaga kelembaban", "Aplikasi fungisida"],
        treatment: ["Fungisida berbahan aktif mankozeb", "Pemangkasan bagian terinfeksi", "Perbaikan drainase"],
        severity: "Sedang",
        tags: &["Jamur", "Kedelai"],
    },
    Seed {
        title: "Hawar Daun Kentang",
        disease_type: "Jamur",
        plant: "Kentang",
        image: "https://s.hdnux.com/photos/01/34/05/54/24140594/6/rawImage.jpg",
        description: "Penyakit jamur yang menyebabkan kerusakan parah pada daun dan umbi kentang, dikenal juga sebagai late blight.",
        symptoms: ["Bercak hitam pada daun", "Daun layu cepat", "Umbi busuk"],
        prevention: ["Fungisida preventif", "Varietas tahan", "Rotasi tanaman"],
        treatment: ["Aplikasi fungisida tembaga", "Cabut tanaman terinfeksi", "Jangan siram dari atas"],
        severity: "Tinggi",
        tags: &["Jamur", "Kentang", "Berbahaya"],
    },
    Seed {
        title: "Spotted Wilt Virus",
        disease_type: "Virus",
        plant: "Tomat",
        image: "https://bioprotectionportal.com/wp-content/uploads/2025/04/tomato-spotted-wilt-virus_symptom-1024x763.jpg",
        description: "Virus yang ditularkan oleh thrips menyebabkan bercak dan layu pada tanaman tomat.",
        symptoms: ["Bercak cincin pada daun", "Buah deformasi", "Tanaman layu"],
        prevention: ["Kontrol thrips", "Varietas tahan", "Mulsa reflektif"],
        treatment: ["Tidak ada obat untuk virus", "Cabut tanaman terinfeksi", "Kontrol vektor thrips"],
        severity: "Tinggi",
        tags: &["Virus", "Tomat", "Serius"],
    },
    Seed {
        title: "Trips Cabai",
        disease_type: "Serangga",
        plant: "Cabai",
        image: "https://assets.corteva.com/is/image/Corteva/ar4-26jun20",
        description: "Hama trips yang menyerang daun dan bunga cabai menyebabkan kerusakan dan penurunan produksi.",
        symptoms: ["Daun keperakan", "Bunga rontok", "Buah cacat"],
        prevention: ["Perangkap warna biru", "Musuh alami", "Rotasi tanaman"],
        treatment: ["Insektisida sistemik", "Penyemprotan minyak neem", "Predator alami"],
        severity: "Sedang",
        tags: &["Serangga", "Cabai"],
    },
    Seed {
        title: "Wereng Coklat",
        disease_type: "Serangga",
        plant: "Padi",
        image: "https://assets.corteva.com/is/image/Corteva/ar4-26jun20",
        description: "Hama utama padi yang mengisap cairan tanaman dan menularkan virus tungro.",
        symptoms: ["Tanaman menguning", "Hopperburn", "Gagal panen"],
        prevention: ["Varietas tahan", "Pengaturan air", "Penanaman serempak"],
        treatment: ["Insektisida selektif", "Pengaturan jarak tanam", "Pengendalian terpadu"],
        severity: "Tinggi",
        tags: &["Serangga", "Padi", "Berbahaya"],
    },
    Seed {
        title: "Bercak Daun Padi",
        disease_type: "Bakteri",
        plant: "Padi",
        image: "https://ipm-cahnr.media.uconn.edu/wp-content/uploads/sites/3216/2023/11/bacterial-speck-gary-e-vallad-university-of-florida.jpeg",
        description: "Penyakit bakteri yang menyebabkan bercak-bercak pada daun padi dan menurunkan hasil panen.",
        symptoms: ["Bercak coklat pada daun", "Daun mengering", "Gabah hampa"],
        prevention: ["Varietas tahan", "Pengaturan air", "Sanitasi lahan"],
        treatment: ["Antibiotik pertanian", "Pemupukan berimbang", "Perbaikan drainase"],
        severity: "Sedang",
        tags: &["Bakteri", "Padi"],
    },
    Seed {
        title: "Layu Fusarium",
        disease_type: "Jamur",
        plant: "Tomat",
        image: "https://assets.corteva.com/is/image/Corteva/ar4-26jun20",
        description: "Penyakit jamur tanah yang menyebabkan layu dan kematian tanaman tomat.",
        symptoms: ["Daun menguning satu sisi", "Pembuluh coklat", "Tanaman layu permanen"],
        prevention: ["Varietas tahan", "Solarisasi tanah", "Drainase baik"],
        treatment: ["Fungisida tanah", "Rotasi tanaman 3-4 tahun", "Sterilisasi media tanam"],
        severity: "Tinggi",
        tags: &["Jamur", "Tomat", "Serius"],
    },
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The seed documents. Ids are placeholders; the store assigns real ones.
pub fn remote_seed() -> Vec<DiseaseRecord> {
    SEEDS
        .iter()
        .map(|seed| DiseaseRecord {
            id: 0,
            title: seed.title.to_string(),
            disease_type: seed.disease_type.to_string(),
            plant: seed.plant.to_string(),
            image: seed.image.to_string(),
            description: seed.description.to_string(),
            symptoms: strings(&seed.symptoms),
            prevention: strings(&seed.prevention),
            treatment: strings(&seed.treatment),
            severity: Some(seed.severity.to_string()),
            tags: seed
                .tags
                .iter()
                .map(|label| Tag {
                    icon: String::new(),
                    label: label.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// Seeds the remote collection if it is empty. Returns how many documents were added.
pub async fn seed_remote_catalog(store: &dyn DocumentStore) -> PortResult<usize> {
    if !store.list_diseases().await?.is_empty() {
        info!("Remote disease collection already populated; skipping seed.");
        return Ok(0);
    }
    let mut inserted = 0;
    for disease in remote_seed() {
        store.insert_disease(&disease).await?;
        inserted += 1;
    }
    info!(count = inserted, "Remote disease collection seeded.");
    Ok(inserted)
}
