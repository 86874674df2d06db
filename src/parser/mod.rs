pub mod bibtex;
pub mod extract;
pub mod html;
