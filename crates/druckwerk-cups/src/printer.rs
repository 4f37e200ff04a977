// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer decoding from CUPS attribute groups.
//
// Decoding degrades gracefully: a field that fails to project is logged and
// left at its zero value, because CUPS routinely omits optional attributes.
// Partial printers beat no printers.

use std::collections::HashMap;

use ipp::prelude::*;
use tracing::warn;

use druckwerk_core::types::{Printer, PrinterState};

use crate::attrs::{self, AttrTag};

/// IPP `printer-state` enum codes (RFC 8011 §5.4.11).
const PRINTER_STATE_IDLE: i32 = 3;
const PRINTER_STATE_PROCESSING: i32 = 4;
const PRINTER_STATE_STOPPED: i32 = 5;

/// Decode one printer from a printer-attributes group.
///
/// `name` may be pre-resolved by the caller (CUPS-Get-Printers keys printers
/// by name); when empty it is projected from the group itself.
pub fn printer_from_group(name: &str, group: &HashMap<String, IppAttribute>) -> Printer {
    let mut printer = Printer {
        name: name.to_string(),
        ..Printer::default()
    };

    if printer.name.is_empty() {
        match attrs::first_value::<String>(group.get(attrs::ATTR_PRINTER_NAME), Some(AttrTag::Name))
        {
            Ok(v) => printer.name = v,
            Err(err) => warn!(%err, "failed to decode printer name"),
        }
    }

    // The uri attribute differs between plain IPP and CUPS responses.
    printer.uri = attrs::first_value::<String>(
        group.get(attrs::ATTR_PRINTER_URI_SUPPORTED),
        Some(AttrTag::Uri),
    )
    .or_else(|_| {
        attrs::first_value::<String>(group.get(attrs::ATTR_PRINTER_URI), Some(AttrTag::Uri))
    })
    .unwrap_or_default();

    match decode_printer_state(group) {
        Ok(state) => printer.state = state,
        Err(err) => warn!(name = %printer.name, %err, "failed to decode printer state"),
    }

    match attrs::first_value::<String>(
        group.get(attrs::ATTR_PRINTER_STATE_REASONS),
        Some(AttrTag::Keyword),
    ) {
        Ok(v) => printer.state_reason = v,
        Err(err) => warn!(name = %printer.name, %err, "failed to decode printer state reason"),
    }

    printer.state_message = attrs::first_value(
        group.get(attrs::ATTR_PRINTER_STATE_MESSAGE),
        Some(AttrTag::Text),
    )
    .unwrap_or_default();
    printer.location =
        attrs::first_value(group.get(attrs::ATTR_PRINTER_LOCATION), Some(AttrTag::Text))
            .unwrap_or_default();
    printer.info = attrs::first_value(group.get(attrs::ATTR_PRINTER_INFO), Some(AttrTag::Text))
        .unwrap_or_default();
    printer.model = attrs::first_value(
        group.get(attrs::ATTR_PRINTER_MAKE_AND_MODEL),
        Some(AttrTag::Text),
    )
    .unwrap_or_default();

    printer
}

/// Decode `printer-state`, reporting unmapped codes without ever failing the
/// containing printer.
fn decode_printer_state(
    group: &HashMap<String, IppAttribute>,
) -> Result<PrinterState, String> {
    let code: i32 =
        attrs::first_value(group.get(attrs::ATTR_PRINTER_STATE), Some(AttrTag::Enum))
            .map_err(|e| e.to_string())?;

    match code {
        PRINTER_STATE_IDLE => Ok(PrinterState::Idle),
        PRINTER_STATE_PROCESSING => Ok(PrinterState::Processing),
        PRINTER_STATE_STOPPED => Ok(PrinterState::Stopped),
        other => Err(format!(
            "unexpected or unsupported printer state value: {other:#04x}"
        )),
    }
}
