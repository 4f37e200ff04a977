// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Job decoding from CUPS attribute groups.

use std::collections::HashMap;

use ipp::prelude::*;
use tracing::warn;

use druckwerk_core::types::{Job, JobState};

use crate::attrs::{self, AttrTag};

/// IPP `job-state` enum codes (RFC 8011 §5.3.7).
const JOB_STATE_PENDING: i32 = 3;
const JOB_STATE_HELD: i32 = 4;
const JOB_STATE_PROCESSING: i32 = 5;
const JOB_STATE_STOPPED: i32 = 6;
const JOB_STATE_CANCELED: i32 = 7;
const JOB_STATE_ABORTED: i32 = 8;
const JOB_STATE_COMPLETED: i32 = 9;

/// Attributes requested for job queries.
///
/// CUPS only returns the basics unless asked; the progress and correlation
/// attributes must be named explicitly.
pub const REQUESTED_JOB_ATTRIBUTES: &[&str] = &[
    attrs::ATTR_JOB_ID,
    attrs::ATTR_JOB_NAME,
    attrs::ATTR_DOCUMENT_NAME,
    attrs::ATTR_JOB_STATE,
    attrs::ATTR_JOB_PRINTER_URI,
    attrs::ATTR_JOB_MEDIA_PROGRESS,
    attrs::ATTR_OPERATION_ID,
];

/// Decode one job from a job-attributes group.
///
/// Field failures are logged and leave the field at its zero value; the job
/// is always returned. `resolve_printer_name` turns the job's printer uri
/// into a friendly name.
pub fn job_from_group(
    job_id: i32,
    group: &HashMap<String, IppAttribute>,
    resolve_printer_name: impl Fn(&str) -> String,
) -> Job {
    let mut job = Job {
        id: job_id,
        ..Job::default()
    };

    match decode_job_state(group) {
        Ok(state) => job.state = state,
        Err(err) => warn!(job_id, %err, "failed to decode job state"),
    }

    // job-name is preferred; some jobs only carry document-name.
    match attrs::first_value::<String>(group.get(attrs::ATTR_JOB_NAME), Some(AttrTag::Name))
        .or_else(|_| {
            attrs::first_value(group.get(attrs::ATTR_DOCUMENT_NAME), Some(AttrTag::Name))
        }) {
        Ok(v) => job.name = v,
        Err(err) => warn!(job_id, %err, "failed to decode job name"),
    }

    // CUPS reports the owning printer as job-printer-uri; plain printer-uri
    // is kept as a fallback.
    match attrs::first_value::<String>(group.get(attrs::ATTR_JOB_PRINTER_URI), Some(AttrTag::Uri))
        .or_else(|_| {
            attrs::first_value(group.get(attrs::ATTR_PRINTER_URI), Some(AttrTag::Uri))
        }) {
        Ok(v) => {
            job.printer_name = resolve_printer_name(&v);
            job.printer_uri = v;
        }
        Err(err) => warn!(job_id, %err, "failed to decode job printer uri"),
    }

    match attrs::first_value::<i32>(group.get(attrs::ATTR_JOB_MEDIA_PROGRESS), None) {
        Ok(v) => job.progress = v,
        Err(err) => warn!(job_id, %err, "failed to decode job progress"),
    }

    match attrs::first_value::<String>(
        group.get(attrs::ATTR_OPERATION_ID),
        Some(AttrTag::OctetString),
    ) {
        Ok(v) => job.operation_id = v,
        Err(err) => warn!(job_id, %err, "failed to decode job operation id"),
    }

    job
}

/// Decode `job-state`, reporting unmapped codes without failing the job.
fn decode_job_state(group: &HashMap<String, IppAttribute>) -> Result<JobState, String> {
    let code: i32 = attrs::first_value(group.get(attrs::ATTR_JOB_STATE), Some(AttrTag::Enum))
        .map_err(|e| format!("failed to get job state: {e}"))?;

    match code {
        JOB_STATE_PENDING => Ok(JobState::Pending),
        JOB_STATE_HELD => Ok(JobState::Held),
        JOB_STATE_PROCESSING => Ok(JobState::Processing),
        JOB_STATE_STOPPED => Ok(JobState::Stopped),
        JOB_STATE_CANCELED => Ok(JobState::Canceled),
        JOB_STATE_ABORTED => Ok(JobState::Aborted),
        JOB_STATE_COMPLETED => Ok(JobState::Complete),
        other => Err(format!("unsupported job state value {other:#04x}")),
    }
}

/// Project the `job-id` out of a job-attributes group, if present.
pub fn job_id_from_group(group: &HashMap<String, IppAttribute>) -> Option<i32> {
    attrs::first_value(group.get(attrs::ATTR_JOB_ID), None).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(entries: Vec<(&str, IppValue)>) -> HashMap<String, IppAttribute> {
        entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), IppAttribute::new(name, value)))
            .collect()
    }

    fn no_resolve(uri: &str) -> String {
        uri.to_string()
    }

    #[test]
    fn full_job_decodes() {
        let g = group(vec![
            (attrs::ATTR_JOB_STATE, IppValue::Enum(5)),
            (attrs::ATTR_JOB_NAME, IppValue::NameWithoutLanguage("invoice.pdf".into())),
            (
                attrs::ATTR_JOB_PRINTER_URI,
                IppValue::Uri("ipp://localhost:631/printers/office-laser".into()),
            ),
            (attrs::ATTR_JOB_MEDIA_PROGRESS, IppValue::Integer(37)),
            (attrs::ATTR_OPERATION_ID, IppValue::OctetString("op-42".into())),
        ]);

        let job = job_from_group(7, &g, |uri| uri.trim_start_matches("ipp://localhost:631/printers/").to_string());
        assert_eq!(job.id, 7);
        assert_eq!(job.state, JobState::Processing);
        assert_eq!(job.name, "invoice.pdf");
        assert_eq!(job.printer_name, "office-laser");
        assert_eq!(job.progress, 37);
        assert_eq!(job.operation_id, "op-42");
    }

    #[test]
    fn job_name_falls_back_to_document_name() {
        let g = group(vec![
            (attrs::ATTR_JOB_STATE, IppValue::Enum(9)),
            (
                attrs::ATTR_DOCUMENT_NAME,
                IppValue::NameWithoutLanguage("report.docx".into()),
            ),
        ]);

        let job = job_from_group(3, &g, no_resolve);
        assert_eq!(job.name, "report.docx");
        assert_eq!(job.state, JobState::Complete);
    }

    #[test]
    fn unmapped_state_degrades_to_unknown() {
        let g = group(vec![(attrs::ATTR_JOB_STATE, IppValue::Enum(42))]);

        let job = job_from_group(1, &g, no_resolve);
        assert_eq!(job.state, JobState::Unknown);
    }

    #[test]
    fn missing_attributes_leave_zero_values() {
        let job = job_from_group(9, &HashMap::new(), no_resolve);
        assert_eq!(job.id, 9);
        assert_eq!(job.state, JobState::Unknown);
        assert!(job.name.is_empty());
        assert!(job.operation_id.is_empty());
        assert_eq!(job.progress, 0);
    }

    #[test]
    fn all_ipp_codes_map() {
        let cases = [
            (3, JobState::Pending),
            (4, JobState::Held),
            (5, JobState::Processing),
            (6, JobState::Stopped),
            (7, JobState::Canceled),
            (8, JobState::Aborted),
            (9, JobState::Complete),
        ];

        for (code, expected) in cases {
            let g = group(vec![(attrs::ATTR_JOB_STATE, IppValue::Enum(code))]);
            assert_eq!(job_from_group(1, &g, no_resolve).state, expected);
        }
    }
}
