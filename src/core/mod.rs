// Pipeline stages, leaves first
pub mod completion {
    pub use crate::completion::*;
}

pub mod derivation {
    pub use crate::derivation::*;
}

pub mod encoding {
    pub use crate::encoding::*;
}

pub mod alignment {
    pub use crate::alignment::*;
}

pub mod scorer {
    pub use crate::scorer::*;
}

pub mod pipeline {
    pub use crate::pipeline::*;
}
