//! Sincronización del ledger con el almacén de documentos remoto.
//!
//! Las dos generaciones de autenticación de SharePoint se modelan como
//! implementaciones de un mismo trait `RemoteSink`, elegidas por la
//! variable `SINK`:
//!
//! - `graph` (`GraphSink`): token v2 de Azure AD y subida vía Microsoft
//!   Graph, resolviendo sitio y biblioteca por nombre.
//! - `legacy` (`LegacySink`): token ACS clásico y subida vía la API REST
//!   `Files/add` de SharePoint.
//!
//! En ambos casos la subida reemplaza por completo la copia remota con
//! los bytes actuales del ledger local; no hay diff ni merge. El token se
//! pide en cada subida y nunca se conserva entre peticiones.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;

mod graph;
mod legacy;

pub use graph::GraphSink;
pub use legacy::LegacySink;

/// Destino remoto del ledger.
///
/// `subir` reemplaza la copia remota con `contenido`. Cualquier fallo
/// (token, resolución de destino o subida) se reporta como error y
/// aborta la petición en curso; la fila local ya quedó escrita y no se
/// revierte.
#[async_trait]
pub trait RemoteSink: Send + Sync {
    async fn subir(&self, contenido: &[u8]) -> Result<(), String>;
}

/// Construye el sink indicado por la configuración.
pub fn desde_config(config: &Config) -> Result<Arc<dyn RemoteSink>, String> {
    let cliente = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_segundos))
        .build()
        .map_err(|e| format!("No se pudo crear el cliente HTTP: {e}"))?;

    match config.sink.as_str() {
        "graph" => Ok(Arc::new(GraphSink::new(cliente, config))),
        "legacy" => Ok(Arc::new(LegacySink::new(cliente, config))),
        otro => Err(format!("SINK desconocido: '{otro}' (use 'graph' o 'legacy')")),
    }
}
