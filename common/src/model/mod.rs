pub mod registro;
pub mod respuesta;
