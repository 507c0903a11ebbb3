//! Pre-flight input validation. Failures here never reach the network.

use crate::types::ScanRequest;
use crate::{Error, ErrorContext, Result};

/// Maximum number of ids (or requests) accepted in one batch call.
pub const MAX_BATCH_SIZE: usize = 100;

pub(crate) fn validate_ids(ids: &[String], field: &str) -> Result<()> {
    if ids.is_empty() {
        return Err(Error::validation_with_context(
            "at least one id is required",
            ErrorContext::new()
                .with_field_path(field)
                .with_source("request_validator"),
        ));
    }
    if ids.len() > MAX_BATCH_SIZE {
        return Err(Error::validation_with_context(
            format!("at most {} ids may be requested at once", MAX_BATCH_SIZE),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(format!("got {}", ids.len()))
                .with_source("request_validator"),
        ));
    }
    if let Some(pos) = ids.iter().position(|id| id.trim().is_empty()) {
        return Err(Error::validation_with_context(
            "ids must not be blank",
            ErrorContext::new()
                .with_field_path(format!("{}[{}]", field, pos))
                .with_source("request_validator"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_scan_request(request: &ScanRequest) -> Result<()> {
    if request.ai_profile.is_empty() {
        return Err(Error::validation_with_context(
            "a security profile name or id is required",
            ErrorContext::new()
                .with_field_path("ai_profile")
                .with_source("request_validator"),
        ));
    }
    if request.contents.is_empty() {
        return Err(Error::validation_with_context(
            "at least one content item is required",
            ErrorContext::new()
                .with_field_path("contents")
                .with_source("request_validator"),
        ));
    }
    if let Some(pos) = request.contents.iter().position(|c| !c.has_text()) {
        return Err(Error::validation_with_context(
            "content item must carry a prompt, response or context",
            ErrorContext::new()
                .with_field_path(format!("contents[{}]", pos))
                .with_source("request_validator"),
        ));
    }
    Ok(())
}

pub(crate) fn validate_async_batch(requests: &[ScanRequest]) -> Result<()> {
    if requests.is_empty() || requests.len() > MAX_BATCH_SIZE {
        return Err(Error::validation_with_context(
            format!(
                "async scans accept between 1 and {} requests",
                MAX_BATCH_SIZE
            ),
            ErrorContext::new()
                .with_field_path("requests")
                .with_details(format!("got {}", requests.len()))
                .with_source("request_validator"),
        ));
    }
    for (i, req) in requests.iter().enumerate() {
        validate_scan_request(req).map_err(|e| match e {
            Error::Validation { message, context } => Error::Validation {
                message,
                context: ErrorContext {
                    field_path: context.field_path.map(|p| format!("requests[{}].{}", i, p)),
                    ..context
                },
            },
            other => other,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AiProfile, ContentItem};

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id-{}", i)).collect()
    }

    fn field(err: &Error) -> Option<&str> {
        err.context().and_then(|c| c.field_path.as_deref())
    }

    #[test]
    fn id_batches_are_bounded() {
        assert!(validate_ids(&ids(1), "scan_ids").is_ok());
        assert!(validate_ids(&ids(MAX_BATCH_SIZE), "scan_ids").is_ok());
        assert!(matches!(
            validate_ids(&[], "scan_ids"),
            Err(Error::Validation { .. })
        ));
        assert!(matches!(
            validate_ids(&ids(MAX_BATCH_SIZE + 1), "scan_ids"),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn blank_ids_are_rejected_with_position() {
        let err = validate_ids(&["a".into(), " ".into()], "report_ids").unwrap_err();
        assert_eq!(field(&err), Some("report_ids[1]"));
    }

    #[test]
    fn scan_request_needs_profile_and_text() {
        let ok = ScanRequest::new(AiProfile::named("p"), vec![ContentItem::prompt("hi")]);
        assert!(validate_scan_request(&ok).is_ok());

        let no_profile = ScanRequest::new(AiProfile::default(), vec![ContentItem::prompt("hi")]);
        assert_eq!(
            field(&validate_scan_request(&no_profile).unwrap_err()),
            Some("ai_profile")
        );

        let no_contents = ScanRequest::new(AiProfile::named("p"), vec![]);
        assert_eq!(
            field(&validate_scan_request(&no_contents).unwrap_err()),
            Some("contents")
        );

        let empty_item = ScanRequest::new(
            AiProfile::named("p"),
            vec![ContentItem::prompt("x"), ContentItem::default()],
        );
        assert_eq!(
            field(&validate_scan_request(&empty_item).unwrap_err()),
            Some("contents[1]")
        );
    }

    #[test]
    fn async_batch_reports_offending_request() {
        let good = ScanRequest::new(AiProfile::named("p"), vec![ContentItem::prompt("hi")]);
        let bad = ScanRequest::new(AiProfile::named("p"), vec![]);
        let err = validate_async_batch(&[good.clone(), bad]).unwrap_err();
        assert_eq!(field(&err), Some("requests[1].contents"));
        assert!(validate_async_batch(&[]).is_err());
        assert!(validate_async_batch(&[good]).is_ok());
    }
}
