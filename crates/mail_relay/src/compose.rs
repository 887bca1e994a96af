use shared::domain::ConsultationRequest;

pub const MISSING_FIELD_PLACEHOLDER: &str = "N/A";
pub const MISSING_DETAILS_PLACEHOLDER: &str = "No details provided.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    pub subject: String,
    pub body: String,
}

pub fn compose_message(request: &ConsultationRequest) -> ComposedMessage {
    let subject = format!("New Consultation Request - {}", request.full_name());
    let body = format!(
        "New Consultation Request\n\
         ------------------------\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Address: {address}\n\
         \n\
         Project Details:\n\
         {details}\n",
        name = request.full_name(),
        email = request.email,
        phone = or_placeholder(&request.phone, MISSING_FIELD_PLACEHOLDER),
        address = or_placeholder(&request.address, MISSING_FIELD_PLACEHOLDER),
        details = or_placeholder(&request.details, MISSING_DETAILS_PLACEHOLDER),
    );
    ComposedMessage { subject, body }
}

pub(crate) fn or_placeholder<'a>(value: &'a Option<String>, placeholder: &'a str) -> &'a str {
    value.as_deref().unwrap_or(placeholder)
}

#[cfg(test)]
#[path = "tests/compose_tests.rs"]
mod tests;
