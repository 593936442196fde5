use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::config::SamlConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamlAssertion {
    pub issuer: String,
    pub audience: Option<String>,
    pub name_id: String,
    pub attributes: Vec<(String, String)>,
}

/// Decodes a SAML `POST` binding's base64(-url) encoded `SAMLResponse`
/// body and extracts the fields validated downstream: `Issuer`, `Audience`,
/// `NameID`, plus any `<Attribute>` values for role-mapping.
pub fn decode_saml_response(encoded: &str) -> Result<SamlAssertion, AuthError> {
    let bytes = STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE.decode(encoded))
        .map_err(|e| AuthError::SamlRejected(format!("invalid base64: {e}")))?;
    let xml = String::from_utf8(bytes)
        .map_err(|e| AuthError::SamlRejected(format!("response is not valid utf-8: {e}")))?;
    parse_assertion(&xml)
}

fn parse_assertion(xml: &str) -> Result<SamlAssertion, AuthError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut issuer = None;
    let mut audience = None;
    let mut name_id = None;
    let mut attributes = Vec::new();

    let mut current_tag: Option<String> = None;
    let mut current_attr_name: Option<String> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| AuthError::SamlRejected(format!("xml parse error: {e}")))?
        {
            Event::Start(tag) => {
                let name = local_name(tag.name().as_ref());
                if name == "Attribute" {
                    current_attr_name = tag
                        .attributes()
                        .flatten()
                        .find(|a| local_name(a.key.as_ref()) == "Name")
                        .map(|a| String::from_utf8_lossy(&a.value).into_owned());
                }
                current_tag = Some(name);
            }
            Event::Text(text) => {
                let decoded = text
                    .decode()
                    .map_err(|e| AuthError::SamlRejected(format!("xml text error: {e}")))?;
                let value = quick_xml::escape::unescape(&decoded)
                    .map_err(|e| AuthError::SamlRejected(format!("xml text error: {e}")))?
                    .into_owned();
                match current_tag.as_deref() {
                    Some("Issuer") if issuer.is_none() => issuer = Some(value),
                    Some("Audience") if audience.is_none() => audience = Some(value),
                    Some("NameID") if name_id.is_none() => name_id = Some(value),
                    Some("AttributeValue") => {
                        if let Some(name) = &current_attr_name {
                            attributes.push((name.clone(), value));
                        }
                    }
                    _ => {}
                }
            }
            Event::End(tag) => {
                if local_name(tag.name().as_ref()) == "Attribute" {
                    current_attr_name = None;
                }
                current_tag = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(SamlAssertion {
        issuer: issuer.ok_or_else(|| AuthError::SamlRejected("missing Issuer".into()))?,
        audience,
        name_id: name_id.ok_or_else(|| AuthError::SamlRejected("missing NameID".into()))?,
        attributes,
    })
}

fn local_name(qualified: &[u8]) -> String {
    let s = String::from_utf8_lossy(qualified);
    s.rsplit(':').next().unwrap_or(&s).to_string()
}

/// Validates an already-decoded assertion against the SP's expected
/// issuer and entity ID (audience).
pub fn validate_assertion(config: &SamlConfig, assertion: &SamlAssertion) -> Result<(), AuthError> {
    if assertion.issuer != config.expected_issuer {
        return Err(AuthError::SamlRejected(format!(
            "unexpected issuer {}",
            assertion.issuer
        )));
    }
    if let Some(audience) = &assertion.audience {
        if audience != &config.sp_entity_id {
            return Err(AuthError::SamlRejected(format!("unexpected audience {audience}")));
        }
    }
    if assertion.name_id.is_empty() {
        return Err(AuthError::SamlRejected("empty NameID".into()));
    }
    Ok(())
}
