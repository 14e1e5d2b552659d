pub mod diagnosis_flow;
pub mod session_state;

pub use diagnosis_flow::{DiagnosisFlow, FlowSettings, PredictionJob, PredictionTicket};
pub use session_state::{SelectedImage, Step};
