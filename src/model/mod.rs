pub use refugium_core::{LifeSimulation, SimulationConfig};
pub mod config {
    pub use refugium_core::config::*;
}
pub mod data {
    pub use refugium_data::*;
}
pub mod disturbance {
    pub use refugium_core::disturbance::*;
}
pub mod environment {
    pub use refugium_core::environment::*;
}
pub mod locality {
    pub use refugium_core::locality::*;
}
pub mod metrics {
    pub use refugium_core::metrics::*;
}
pub mod resources {
    pub use refugium_core::resources::*;
}
pub mod rng {
    pub use refugium_core::rng::*;
}
pub mod simulation {
    pub use refugium_core::simulation::*;
}
pub mod strategy {
    pub use refugium_core::strategy::*;
}
pub mod taxon_registry {
    pub use refugium_core::taxon_registry::*;
}
