pub mod assess;
pub mod db;
pub mod history;
pub mod reference;
pub mod settings;
pub mod workspace;
