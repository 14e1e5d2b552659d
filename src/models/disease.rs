//! 病虫害知识库
//!
//! 静态查找表，键为模型输出的类别 ID（与 metadata.json 中的 labels 一致）

use phf::phf_map;
use serde::Serialize;

/// 严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Severe,
    Moderate,
    Mild,
    Healthy,
    Other,
}

impl Severity {
    /// 从标签解析，未知标签归为 `Other`
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "severe" => Severity::Severe,
            "moderate" => Severity::Moderate,
            "mild" => Severity::Mild,
            "healthy" => Severity::Healthy,
            _ => Severity::Other,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Severity::Severe => "severe",
            Severity::Moderate => "moderate",
            Severity::Mild => "mild",
            Severity::Healthy => "healthy",
            Severity::Other => "other",
        }
    }
}

/// 类别种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseKind {
    Disease,
    Pest,
    Healthy,
}

/// 单个类别的描述信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiseaseInfo {
    /// 印尼语名称
    pub name_id: &'static str,
    pub name_en: &'static str,
    /// 病原或害虫学名
    pub scientific_name: Option<&'static str>,
    pub kind: DiseaseKind,
    pub severity: Severity,
    pub description: &'static str,
    pub symptoms: &'static [&'static str],
    pub treatment: &'static [&'static str],
    pub prevention: &'static [&'static str],
}

static DISEASES: phf::Map<&'static str, DiseaseInfo> = phf_map! {
    "Bacterial Leaf Blight" => DiseaseInfo {
        name_id: "Hawar Daun Bakteri",
        name_en: "Bacterial Leaf Blight",
        scientific_name: Some("Xanthomonas oryzae pv. oryzae"),
        kind: DiseaseKind::Disease,
        severity: Severity::Severe,
        description: "Penyakit bakteri yang menyebabkan daun mengering dari ujung dan tepi, dapat menurunkan hasil panen secara signifikan.",
        symptoms: &[
            "Garis kuning hingga putih keabuan dari ujung daun",
            "Tepi daun bergelombang dan mengering",
            "Tetesan eksudat bakteri berwarna kekuningan di pagi hari",
        ],
        treatment: &[
            "Kurangi pemupukan nitrogen berlebih",
            "Keringkan petakan secara berkala",
            "Gunakan bakterisida berbahan aktif tembaga sesuai anjuran",
        ],
        prevention: &[
            "Gunakan varietas tahan seperti Inpari 32",
            "Jaga sanitasi sisa tanaman dan gulma inang",
        ],
    },
    "Brown Spot" => DiseaseInfo {
        name_id: "Bercak Coklat",
        name_en: "Brown Spot",
        scientific_name: Some("Bipolaris oryzae"),
        kind: DiseaseKind::Disease,
        severity: Severity::Moderate,
        description: "Penyakit jamur yang umum pada lahan kurang subur, menimbulkan bercak oval coklat pada daun dan gabah.",
        symptoms: &[
            "Bercak oval coklat dengan pusat keabuan",
            "Halo kuning di sekitar bercak",
            "Gabah berbintik dan hampa",
        ],
        treatment: &[
            "Aplikasikan fungisida berbahan aktif mankozeb atau propikonazol",
            "Perbaiki kesuburan tanah dengan pupuk kalium",
        ],
        prevention: &[
            "Gunakan benih sehat dan perlakuan benih",
            "Pemupukan berimbang",
        ],
    },
    "Leaf Blast" => DiseaseInfo {
        name_id: "Blas Daun",
        name_en: "Leaf Blast",
        scientific_name: Some("Pyricularia oryzae"),
        kind: DiseaseKind::Disease,
        severity: Severity::Severe,
        description: "Penyakit jamur paling merusak pada padi, berkembang cepat pada kelembapan tinggi dan pemupukan nitrogen berlebih.",
        symptoms: &[
            "Bercak berbentuk belah ketupat dengan pusat putih keabuan",
            "Tepi bercak berwarna coklat kemerahan",
            "Daun mengering bila bercak menyatu",
        ],
        treatment: &[
            "Semprot fungisida berbahan aktif trisiklazol",
            "Hentikan sementara pemupukan nitrogen",
        ],
        prevention: &[
            "Tanam varietas tahan blas",
            "Atur jarak tanam agar sirkulasi udara baik",
        ],
    },
    "Tungro" => DiseaseInfo {
        name_id: "Tungro",
        name_en: "Rice Tungro Disease",
        scientific_name: Some("Rice tungro bacilliform virus"),
        kind: DiseaseKind::Disease,
        severity: Severity::Severe,
        description: "Penyakit virus yang ditularkan wereng hijau, menyebabkan tanaman kerdil dan daun menguning oranye.",
        symptoms: &[
            "Daun muda berwarna kuning hingga oranye",
            "Tanaman kerdil dengan anakan sedikit",
        ],
        treatment: &[
            "Cabut dan musnahkan tanaman terinfeksi",
            "Kendalikan wereng hijau dengan insektisida selektif",
        ],
        prevention: &[
            "Tanam serempak dalam satu hamparan",
            "Gunakan varietas tahan tungro",
        ],
    },
    "Hispa" => DiseaseInfo {
        name_id: "Hama Putih Palsu (Hispa)",
        name_en: "Rice Hispa",
        scientific_name: Some("Dicladispa armigera"),
        kind: DiseaseKind::Pest,
        severity: Severity::Mild,
        description: "Kumbang kecil yang mengikis permukaan daun sehingga muncul garis putih memanjang.",
        symptoms: &[
            "Garis putih sejajar tulang daun",
            "Terowongan larva di dalam jaringan daun",
        ],
        treatment: &[
            "Potong ujung daun yang berisi larva",
            "Gunakan insektisida bila populasi melewati ambang ekonomi",
        ],
        prevention: &[
            "Hindari pemupukan nitrogen berlebih",
            "Bersihkan gulma di pematang",
        ],
    },
    "Healthy" => DiseaseInfo {
        name_id: "Sehat",
        name_en: "Healthy",
        scientific_name: None,
        kind: DiseaseKind::Healthy,
        severity: Severity::Healthy,
        description: "Daun tidak menunjukkan gejala penyakit maupun serangan hama.",
        symptoms: &[],
        treatment: &[],
        prevention: &[
            "Lanjutkan pemupukan berimbang",
            "Pantau tanaman secara rutin",
        ],
    },
};

/// 按类别 ID 查找描述信息
pub fn lookup(class_id: &str) -> Option<&'static DiseaseInfo> {
    DISEASES.get(class_id)
}

/// 知识库中的全部类别 ID
pub fn known_classes() -> impl Iterator<Item = &'static str> {
    DISEASES.keys().copied()
}

/// 类别的本地化名称，知识库中没有时直接返回类别 ID
pub fn localized_name(class_id: &str) -> String {
    lookup(class_id)
        .map(|info| info.name_id.to_string())
        .unwrap_or_else(|| class_id.to_string())
}
