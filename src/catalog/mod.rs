pub mod r#type;
pub mod value;
