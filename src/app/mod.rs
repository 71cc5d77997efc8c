pub mod augment_use_case;
pub mod curate_use_case;
pub mod parse_resume_use_case;
pub mod ports;
pub mod refine_use_case;

pub use augment_use_case::{AugmentReport, AugmentUseCase};
pub use parse_resume_use_case::{ParseResumeUseCase, ParsedResume};
pub use refine_use_case::{RefineReport, RefineUseCase};
