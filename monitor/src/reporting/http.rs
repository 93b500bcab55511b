use crate::reporting::evidence::EvidenceStore;
use anyhow::Context;
use curbcore::interface::InfractionReport;
use curbcore::prelude::{MonitorError, MonitorResult};
use curbcore::reporting::Reporter;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use std::future::Future;
use std::path::Path;
use std::time::Duration;

/// Posts reports to the infractions endpoint as multipart form data:
/// `mensaje` carries the description and `image` the evidence frame.
#[derive(Clone)]
pub struct HttpReporter {
    client: reqwest::Client,
    url: String,
    evidence: Option<EvidenceStore>,
}

impl HttpReporter {
    pub fn new(
        url: impl Into<String>,
        timeout_secs: u64,
        evidence: Option<EvidenceStore>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .context("building reporting HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
            evidence,
        })
    }
}

fn evidence_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

async fn build_form(report: &InfractionReport, evidence: Option<&EvidenceStore>) -> Form {
    let form = Form::new().text("mensaje", report.description.clone());
    let Some(source) = report.evidence.as_ref() else {
        return form;
    };

    let archived = match evidence {
        Some(store) => match store.archive(source, report.timestamp).await {
            Ok(path) => path,
            Err(err) => {
                warn!("could not archive evidence {}: {:#}", source.display(), err);
                source.clone()
            }
        },
        None => source.clone(),
    };

    match tokio::fs::read(&archived).await {
        Ok(bytes) => {
            let file_name = archived
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "evidence.jpg".to_string());
            let mime = evidence_mime(&archived);
            match Part::bytes(bytes).file_name(file_name).mime_str(mime) {
                Ok(part) => form.part("image", part),
                Err(err) => {
                    warn!("skipping evidence part: {}", err);
                    form
                }
            }
        }
        Err(err) => {
            warn!(
                "evidence {} unreadable, sending text only: {}",
                archived.display(),
                err
            );
            form
        }
    }
}

impl Reporter for HttpReporter {
    fn deliver(
        &self,
        report: &InfractionReport,
    ) -> impl Future<Output = MonitorResult<u16>> + Send {
        let client = self.client.clone();
        let url = self.url.clone();
        let evidence = self.evidence.clone();
        let report = report.clone();

        async move {
            let form = build_form(&report, evidence.as_ref()).await;
            let response = client
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(|err| MonitorError::DeliveryFailure(err.to_string()))?;
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            debug!("reporting service answered {}: {}", status, body);
            Ok(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::TcpListener;
    use std::path::PathBuf;

    #[test]
    fn evidence_mime_follows_extension() {
        assert_eq!(evidence_mime(&PathBuf::from("infraction_0000003000.png")), "image/png");
        assert_eq!(evidence_mime(&PathBuf::from("frame.JPG")), "image/jpeg");
        assert_eq!(evidence_mime(&PathBuf::from("frame")), "image/jpeg");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_delivery_failure() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/api/infractions/", port);
        let reporter = HttpReporter::new(url, 1, None).unwrap();
        let report = InfractionReport::new(1, 3.0, None);
        let result = reporter.deliver(&report).await;
        assert!(matches!(result, Err(MonitorError::DeliveryFailure(_))));
    }
}
