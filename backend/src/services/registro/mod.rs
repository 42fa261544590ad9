//! Endpoint de altas de personal.
//!
//! El formulario manda todo a la raíz del servicio; este módulo arma el
//! recurso `/` con sus dos métodos:
//!
//! *   **`POST /`**:
//!     - **Handler**: `submit::process`
//!     - **Descripción**: recibe un alta como JSON (adjuntos en data URIs
//!       base64) o como formulario multipart (adjuntos como partes de
//!       archivo). Guarda los adjuntos en disco, agrega la fila de 24
//!       columnas al ledger local y sube el ledger completo al almacén
//!       remoto. Contrato externo: `200 {"ok": true}` en éxito,
//!       `500 {"ok": false, "error": "..."}` en fallo.
//!
//! *   **`GET /`**:
//!     - **Handler**: `estaticos::serve_embedded`
//!     - **Descripción**: sirve la página del formulario embebida en el
//!       binario. El resto de la carcasa estática (`/manifest.json`,
//!       `/service-worker.js`) se atiende por el default service.

mod submit;

pub mod archivos;

use actix_web::web;
use actix_web::Resource;

use crate::estaticos;

/// Configura el recurso raíz del servicio.
pub fn configure_routes() -> Resource {
    web::resource("/")
        .route(web::post().to(submit::process))
        .route(web::get().to(estaticos::serve_embedded))
}
