//! Report generation request assembly
//!
//! The reporter backend notifies a channel once a file is ready. Merchant
//! users are notified on their merchant channel; users without a merchant
//! fall back to their profile channel, which the reporter cannot
//! post-process.

use billgate_core::{Identity, ReportFileRequest};
use tracing::debug;

use crate::dto::ReportFileInput;
use crate::error::ServiceResult;
use crate::validation::{Constraint, Format, Validate, ValidationSpec};

/// Report kinds the reporter can produce
pub const REPORT_TYPES: &[&str] = &[
    "royalty",
    "royalty_transactions",
    "vat",
    "vat_transactions",
    "transactions",
    "payout",
    "agreement",
];

/// Output formats the reporter can produce
pub const FILE_TYPES: &[&str] = &["pdf", "csv", "xlsx"];

impl Validate for ReportFileRequest {
    fn validation_spec() -> ValidationSpec {
        ValidationSpec::new()
            .field(
                "report_type",
                [Constraint::Required, Constraint::one_of(REPORT_TYPES.iter().copied())],
            )
            .field(
                "file_type",
                [Constraint::Required, Constraint::one_of(FILE_TYPES.iter().copied())],
            )
            .field("merchant_id", [Constraint::Format(Format::ObjectId)])
            .field("user_id", [Constraint::Required])
            .field("notification_channel_id", [Constraint::Required])
    }
}

/// Build the reporter request for `input` on behalf of `identity`
///
/// The populated request is validated before it is returned, so nothing
/// invalid reaches the reporter.
pub fn prepare_report_file(
    input: ReportFileInput,
    identity: &Identity,
) -> ServiceResult<ReportFileRequest> {
    // Callers bound to a merchant only ever report on that merchant
    let merchant_id = if identity.merchant_id.is_empty() {
        input.merchant_id
    } else {
        identity.merchant_id.clone()
    };

    let mut request = ReportFileRequest {
        report_type: input.report_type,
        file_type: input.file_type.to_ascii_lowercase(),
        merchant_id,
        params: input.params,
        user_id: identity.id.clone(),
        notification_channel_id: String::new(),
        skip_post_process: false,
    };

    apply_notification_target(&mut request, identity);
    request.validate()?;

    debug!(
        report_type = %request.report_type,
        channel = %request.notification_channel_id,
        skip_post_process = request.skip_post_process,
        "Prepared report file request"
    );

    Ok(request)
}

/// Pick the channel notified when the file is ready
pub fn apply_notification_target(request: &mut ReportFileRequest, identity: &Identity) {
    if !identity.merchant_id.is_empty() {
        request.notification_channel_id = identity.merchant_id.clone();
        request.skip_post_process = false;
    } else {
        request.notification_channel_id = identity.profile_id.clone();
        request.skip_post_process = true;
    }
}
