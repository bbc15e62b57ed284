pub use super::images::Entity as Images;
