#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl Email {
    pub fn password_reset(to: &str, reset_link: &str) -> Self {
        Email {
            to: to.to_string(),
            subject: "Adopta Pets: recuperación de contraseña".to_string(),
            html_body: format!(
                "<p>Hola,</p><p>Para restablecer tu contraseña haz clic en el siguiente enlace \
                 (válido durante 1 hora):</p><p><a href=\"{0}\">{0}</a></p>\
                 <p>Si no lo solicitaste, ignora este correo.</p>",
                reset_link
            ),
            text_body: format!(
                "Hola,\n\nPara restablecer tu contraseña abre el siguiente enlace \
                (válido durante 1 hora):\n\n{}\n\n\
                Si no solicitaste el cambio, ignora este correo.\n\n\
                El equipo de Adopta Pets",
                reset_link
            ),
        }
    }
}
