//! Sirve la carcasa estática del formulario (página, manifest y service
//! worker) embebida en el binario.

use actix_web::{HttpRequest, HttpResponse};
use include_dir::{include_dir, Dir};
use mime_guess::from_path;

static ESTATICOS: Dir = include_dir!("$CARGO_MANIFEST_DIR/static");

/// Atiende `GET /` y cualquier ruta sin recurso propio.
///
/// Una ruta desconocida cae a `index.html`: el formulario es la única
/// página y el service worker pide `/` cuando está sin conexión.
pub async fn serve_embedded(req: HttpRequest) -> HttpResponse {
    let ruta = req.path().trim_start_matches('/');
    let objetivo = if ruta.is_empty() { "index.html" } else { ruta };

    match ESTATICOS.get_file(objetivo) {
        Some(archivo) => {
            let mime = from_path(objetivo).first_or_octet_stream();
            HttpResponse::Ok()
                .content_type(mime.as_ref())
                .body(archivo.contents().to_vec())
        }
        None => match ESTATICOS.get_file("index.html") {
            Some(pagina) => HttpResponse::Ok()
                .content_type("text/html; charset=utf-8")
                .body(pagina.contents().to_vec()),
            None => HttpResponse::NotFound().body("Not Found"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    #[actix_web::test]
    async fn sirve_la_carcasa_embebida() {
        let app = test::init_service(
            App::new().default_service(web::route().to(serve_embedded)),
        )
        .await;

        for ruta in ["/", "/manifest.json", "/service-worker.js"] {
            let req = test::TestRequest::get().uri(ruta).to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success(), "fallo en {ruta}");
        }
    }
}
