pub mod email;
pub mod html;
pub mod oauth1;
