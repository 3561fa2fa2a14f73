use std::time::Duration;

use serde_json::json;

use crate::config::AppConfig;

/// Outbound notification mail, relayed over HTTP. Delivery is best
/// effort: every failure is logged and swallowed, callers never see one.
#[derive(Debug, Clone)]
pub struct MailerClient {
    http: reqwest::Client,
    relay_url: String,
    relay_token: String,
    from: String,
    frontend_url: String,
    enabled: bool,
}

impl MailerClient {
    pub fn from_config(config: &AppConfig) -> Self {
        let timeout = Duration::from_millis(config.mail_timeout_ms.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            relay_url: config.mail_relay_url.clone(),
            relay_token: config.mail_relay_token.clone(),
            from: config.mail_from.clone(),
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
            enabled: config.mail_enabled,
        }
    }

    pub async fn send_adoption_request_received(
        &self,
        rescuer_email: &str,
        rescuer_name: &str,
        adopter_name: &str,
        dog_name: &str,
    ) {
        let subject = format!("Nueva solicitud de adopción para {dog_name}");
        let body = layout(&format!(
            "<h2>Hola {rescuer_name},</h2>\
             <p>Tienes una nueva solicitud de adopción para <strong>{dog_name}</strong>.</p>\
             <div class=\"card\"><p><strong>Adoptante:</strong> {adopter_name}</p></div>\
             <p>Revisa los detalles en tu panel y decide si aprobarla o rechazarla.</p>\
             {button}",
            button = self.button("/dashboard/rescuer", "Ver panel"),
        ));
        self.deliver(rescuer_email, &subject, &body, "adoption_request_received")
            .await;
    }

    pub async fn send_adoption_approved(
        &self,
        adopter_email: &str,
        adopter_name: &str,
        dog_name: &str,
        rescuer_name: &str,
    ) {
        let subject = "Tu solicitud de adopción ha sido aprobada".to_string();
        let body = layout(&format!(
            "<h2>¡Felicidades {adopter_name}!</h2>\
             <p>Tu solicitud para adoptar a <strong>{dog_name}</strong> fue aprobada por {rescuer_name}.</p>\
             <div class=\"card ok\"><p>✓ Solicitud aprobada</p></div>\
             <p>Coordina los siguientes pasos con el rescatista a través del chat.</p>\
             {button}",
            button = self.button("/chat", "Ir al chat"),
        ));
        self.deliver(adopter_email, &subject, &body, "adoption_approved")
            .await;
    }

    pub async fn send_adoption_cancelled(
        &self,
        rescuer_email: &str,
        rescuer_name: &str,
        adopter_name: &str,
        dog_name: &str,
        reason: &str,
    ) {
        let subject = format!("Adopción cancelada: {dog_name}");
        let body = layout(&format!(
            "<h2>Hola {rescuer_name},</h2>\
             <p>{adopter_name} ha cancelado su solicitud de adopción para <strong>{dog_name}</strong>.</p>\
             <div class=\"card warn\"><p><strong>Motivo:</strong></p><p>{reason}</p></div>\
             <p>{dog_name} estará disponible nuevamente para otros adoptantes.</p>\
             {button}",
            button = self.button("/dashboard/rescuer", "Ver panel"),
        ));
        self.deliver(rescuer_email, &subject, &body, "adoption_cancelled")
            .await;
    }

    pub async fn send_new_message(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        sender_name: &str,
        message_preview: &str,
    ) {
        let preview: String = message_preview.chars().take(100).collect();
        let ellipsis = if message_preview.chars().count() > 100 {
            "..."
        } else {
            ""
        };
        let subject = format!("Nuevo mensaje de {sender_name}");
        let body = layout(&format!(
            "<h2>Hola {recipient_name},</h2>\
             <p>Tienes un nuevo mensaje de <strong>{sender_name}</strong>.</p>\
             <div class=\"card\"><p><em>\"{preview}{ellipsis}\"</em></p></div>\
             <p>Responde desde la plataforma para continuar la conversación.</p>\
             {button}",
            button = self.button("/chat", "Ver mensajes"),
        ));
        self.deliver(recipient_email, &subject, &body, "new_message")
            .await;
    }

    fn button(&self, path: &str, label: &str) -> String {
        format!(
            "<p class=\"cta\"><a href=\"{}{path}\">{label}</a></p>",
            self.frontend_url
        )
    }

    async fn deliver(&self, to: &str, subject: &str, html: &str, template: &'static str) {
        if !self.enabled {
            tracing::debug!(template, to, "mail disabled; skipping send");
            return;
        }
        if to.trim().is_empty() {
            tracing::warn!(template, "missing recipient address; skipping send");
            return;
        }

        let payload = json!({
            "from": self.from,
            "to": to,
            "subject": subject,
            "html": html,
        });
        let mut request = self.http.post(&self.relay_url).json(&payload);
        if !self.relay_token.is_empty() {
            request = request.bearer_auth(&self.relay_token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(template, to, "mail relayed");
            }
            Ok(response) => {
                tracing::warn!(
                    template,
                    status = response.status().as_u16(),
                    "mail relay rejected send"
                );
            }
            Err(err) => {
                tracing::warn!(template, error = %err, "mail relay unreachable");
            }
        }
    }
}

fn layout(content: &str) -> String {
    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <div class=\"header\"><h1>Patitas</h1></div>\
         <div class=\"body\">{content}</div>\
         <div class=\"footer\"><p>Este correo fue enviado automáticamente. Por favor no respondas a este mensaje.</p></div>\
         </div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_wraps_content_with_footer() {
        let html = layout("<p>hola</p>");
        assert!(html.contains("<p>hola</p>"));
        assert!(html.contains("no respondas"));
    }
}
