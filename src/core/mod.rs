// Domain-layer records and shared errors
pub mod attributes {
    pub use crate::attributes::*;
}

pub mod branch {
    pub use crate::branch::*;
}

pub mod property {
    pub use crate::property::*;
}

pub mod errors {
    pub use crate::errors::*;
}
