pub mod answers;
pub mod diagnosis;
pub mod disease;
pub mod image;
pub mod prediction;

pub use answers::{AnswerSet, QUESTIONNAIRE};
pub use diagnosis::DiagnosisResult;
pub use disease::{DiseaseInfo, DiseaseKind, Severity};
pub use image::{PreparedImage, UploadedImage};
pub use prediction::{ClassProbability, Prediction};
