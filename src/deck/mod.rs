pub mod composition;

pub use composition::{
    build_composition, Composition, CompositionError, Kind, KindClass, DESIRES_ID, PROSPERITY_ID,
    UNKNOWN_ID,
};
