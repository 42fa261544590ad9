//! Variante clásica del sink: token ACS y subida por la API REST de
//! SharePoint (`Files/add` con sobrescritura).

use async_trait::async_trait;
use log::info;
use serde_json::Value;

use crate::config::Config;
use crate::sink::RemoteSink;

/// Principal de SharePoint Online en el registro ACS.
const PRINCIPAL_SHAREPOINT: &str = "00000003-0000-0ff1-ce00-000000000000";

pub struct LegacySink {
    cliente: reqwest::Client,
    client_id: String,
    client_secret: String,
    tenant_id: String,
    site_url: String,
    carpeta: String,
    documento: String,
}

impl LegacySink {
    pub fn new(cliente: reqwest::Client, config: &Config) -> Self {
        Self {
            cliente,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            tenant_id: config.tenant_id.clone(),
            site_url: config.site_url.clone(),
            carpeta: config.carpeta.clone(),
            documento: config.documento.clone(),
        }
    }

    async fn obtener_token(&self) -> Result<String, String> {
        let url = format!(
            "https://accounts.accesscontrol.windows.net/{}/tokens/OAuth/2",
            self.tenant_id
        );
        let host = host_del_sitio(&self.site_url);
        let client_id = format!("{}@{}", self.client_id, self.tenant_id);
        let resource = format!("{PRINCIPAL_SHAREPOINT}/{host}@{}", self.tenant_id);
        let respuesta = self
            .cliente
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("resource", resource.as_str()),
            ])
            .send()
            .await
            .map_err(|e| format!("token: {e}"))?;

        if !respuesta.status().is_success() {
            return Err(format!("token: HTTP {}", respuesta.status().as_u16()));
        }
        let cuerpo: Value = respuesta.json().await.map_err(|e| format!("token: {e}"))?;
        cuerpo
            .get("access_token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| "token: la respuesta no trae access_token".to_string())
    }
}

#[async_trait]
impl RemoteSink for LegacySink {
    async fn subir(&self, contenido: &[u8]) -> Result<(), String> {
        let token = self.obtener_token().await?;
        let url = url_subida(&self.site_url, &self.carpeta, &self.documento);
        let respuesta = self
            .cliente
            .post(&url)
            .bearer_auth(&token)
            .header("Accept", "application/json;odata=verbose")
            .body(contenido.to_vec())
            .send()
            .await
            .map_err(|e| format!("subida: {e}"))?;

        match respuesta.status().as_u16() {
            200 | 201 => {
                info!(
                    "Ledger subido a {}/{} ({} bytes)",
                    self.carpeta,
                    self.documento,
                    contenido.len()
                );
                Ok(())
            }
            otro => Err(format!("subida: HTTP {otro}")),
        }
    }
}

fn host_del_sitio(site_url: &str) -> String {
    let sin_esquema = site_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    match sin_esquema.split_once('/') {
        Some((host, _)) => host.to_string(),
        None => sin_esquema.to_string(),
    }
}

fn url_subida(site_url: &str, carpeta: &str, documento: &str) -> String {
    format!(
        "{}/_api/web/GetFolderByServerRelativeUrl('{}')/Files/add(url='{}',overwrite=true)",
        site_url.trim_end_matches('/'),
        carpeta,
        documento
    )
}
