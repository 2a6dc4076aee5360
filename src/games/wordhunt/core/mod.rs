mod grid;
pub use grid::Grid;

mod position;
pub use position::{Direction, Position};

pub mod placer;
pub use placer::{PlacedWord, WordPlacer};

pub mod selection;
pub use selection::{is_match, Gesture};

mod word;
pub use word::{ParseWordError, Word};
