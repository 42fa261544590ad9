//! Estado compartido de la aplicación.
//!
//! Se construye una vez en `main.rs` y se inyecta en Actix como
//! `web::Data`. No hay más estado entre peticiones que esto (y el id de
//! sitio que cachea `GraphSink`).

use std::path::PathBuf;
use std::sync::Arc;

use crate::ledger::Ledger;
use crate::sink::RemoteSink;

pub struct AppState {
    /// Directorio donde se materializan los adjuntos.
    pub fotos_dir: PathBuf,
    /// El libro local de altas.
    pub ledger: Ledger,
    /// Destino remoto del ledger.
    pub sink: Arc<dyn RemoteSink>,
}
