pub mod composite;
pub mod transform;
