mod generate_service;
mod inspect_service;

pub use generate_service::{
    GenerateOptions, GenerateService, GeneratedTree, GenerationPlan, GenerationReport,
};
pub use inspect_service::{GraphLink, GraphNode, GraphReport, InspectService};
