pub mod buttons;
pub mod cards;
pub mod forms;
pub mod modal;
pub mod rating;
pub mod status;

pub use buttons::*;
pub use cards::*;
pub use forms::*;
pub use modal::*;
pub use rating::*;
pub use status::*;
