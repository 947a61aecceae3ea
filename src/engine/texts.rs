//! User-facing message texts.
//!
//! Everything the bot says lives here, parameterized by company settings so
//! the wording stays in one place. Replies are Spanish, matching the
//! workforce the bot serves.

use recibo_core::config::CompanyConfig;
use recibo_core::event::QuickReplyButton;

pub fn welcome_menu(company: &CompanyConfig, name: Option<&str>) -> String {
    let saludo = match name {
        Some(n) => format!("¡Hola, {n}! 👋"),
        None => "¡Hola! 👋".to_string(),
    };
    format!(
        "{saludo} Soy el asistente virtual de {}.\n\n\
         ¿En qué puedo ayudarte?\n\n\
         1️⃣ Líneas de atención\n\
         2️⃣ Recibo de nómina\n\
         3️⃣ ¿Cómo te sientes hoy?\n\
         4️⃣ PQRS\n\
         5️⃣ Política de datos\n\
         6️⃣ Dejar de recibir mensajes\n\n\
         Responde con el número de la opción.",
        company.name
    )
}

pub fn contact_lines(company: &CompanyConfig) -> String {
    format!(
        "📞 Líneas de atención de {}:\n\n\
         • Recursos humanos: {}\n\
         • Contabilidad: {}\n\
         • Seguridad y salud: {}\n\n\
         Escribe *menu* para volver al inicio.",
        company.name, company.hr_line, company.accounting_line, company.safety_line
    )
}

pub fn mood_unavailable() -> String {
    "Esta opción no está disponible por el momento. 🙏\n\n\
     Escribe *menu* para volver al inicio."
        .to_string()
}

pub fn pqrs(company: &CompanyConfig) -> String {
    format!(
        "📋 Para radicar una petición, queja, reclamo o sugerencia:\n\n\
         • Portal: {}\n\
         • Correo: {}\n\n\
         Escribe *menu* para volver al inicio.",
        company.pqrs_url, company.pqrs_email
    )
}

pub fn data_policy(company: &CompanyConfig) -> String {
    format!(
        "🔒 Puedes consultar nuestra política de tratamiento de datos en {}.\n\n\
         Escribe *menu* para volver al inicio.",
        company.website
    )
}

pub fn unsubscribed() -> String {
    "Listo, no recibirás más mensajes de este número. \
     Si cambias de opinión, escríbenos cuando quieras. 👋"
        .to_string()
}

pub fn ask_national_id() -> String {
    "Para enviarte tu recibo de nómina necesito verificar tu identidad.\n\n\
     Por favor escribe tu número de cédula (solo números).\n\n\
     Escribe *cancelar* para volver al menú."
        .to_string()
}

pub fn invalid_national_id(reason: &str) -> String {
    format!("⚠️ {reason}. Inténtalo de nuevo, o escribe *cancelar* para volver al menú.")
}

pub fn unknown_national_id(id: &str) -> String {
    format!(
        "No encontré la cédula {id} en nuestro sistema. 😕\n\n\
         Revísala e inténtalo de nuevo, o escribe *cancelar* para volver al menú."
    )
}

pub fn ask_issue_date(name: &str) -> String {
    format!(
        "¡Hola, {name}! 👋\n\n\
         Ahora escribe la fecha de expedición de tu cédula en formato DD/MM/AAAA \
         (ejemplo: 15/03/1990)."
    )
}

pub fn invalid_issue_date(reason: &str) -> String {
    format!("⚠️ {reason}. Inténtalo de nuevo, o escribe *cancelar* para volver al menú.")
}

pub fn not_registered() -> String {
    "No encontré tu cédula en nuestro sistema. 😕\n\n\
     Si crees que es un error, comunícate con recursos humanos. \
     Escribe *menu* para volver al inicio."
        .to_string()
}

pub fn date_mismatch() -> String {
    "La fecha de expedición no coincide con nuestros registros. \
     Revísala e inténtalo de nuevo, o escribe *cancelar* para volver al menú."
        .to_string()
}

pub fn folder_choice_body() -> String {
    "✅ Identidad verificada. Encontré recibos a tu nombre.\n\n¿Cuál necesitas?".to_string()
}

pub fn folder_choice_buttons() -> Vec<QuickReplyButton> {
    vec![
        QuickReplyButton::new("1", "Quincena anterior"),
        QuickReplyButton::new("2", "Quincena actual"),
    ]
}

pub fn invalid_folder_choice() -> String {
    "No entendí tu elección. Responde *1* para la quincena anterior o *2* \
     para la quincena actual, o escribe *cancelar* para volver al menú."
        .to_string()
}

pub fn no_receipts_anywhere() -> String {
    "Verifiqué tu identidad, pero no encontré recibos a tu nombre en el archivo. 😕\n\n\
     Si crees que es un error, comunícate con recursos humanos. \
     Escribe *menu* para volver al inicio."
        .to_string()
}

pub fn no_receipts(folder_label: &str) -> String {
    format!(
        "No encontré recibos tuyos en la {folder_label}. 😕\n\n\
         Si crees que es un error, comunícate con recursos humanos. \
         Escribe *menu* para volver al inicio."
    )
}

pub fn receipt_sent() -> String {
    "¡Listo! 📄 Ahí tienes tu recibo.\n\n\
     Escribe *menu* si necesitas algo más."
        .to_string()
}

pub fn service_error() -> String {
    "Lo siento, tuve un problema consultando el archivo de recibos. 😔\n\n\
     Inténtalo de nuevo en unos minutos, o escribe *menu* para volver al inicio."
        .to_string()
}

pub fn cancelled() -> String {
    "Sin problema, cancelé la solicitud. 👍".to_string()
}
