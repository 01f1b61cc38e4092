//! Generic layout for other tools and incomplete documents.

use serde_json::Value;

use crate::conf::{TUP_KEYS_GENERIC_MAPPING, TUP_KEYS_GENERIC_SCALAR, TUP_KEYS_GENERIC_SKIPPED};
use crate::cursor::SheetCursor;
use crate::layout::sorted_keys;
use crate::profile::{ProfileDocument, describe_value};

/// Lay out every known top-level key of `doc`, in key order.
pub fn layout_generic(cursor: &mut SheetCursor, doc: &ProfileDocument) {
    for c_key in sorted_keys(doc.root()) {
        let c_key = c_key.as_str();
        if TUP_KEYS_GENERIC_SKIPPED.contains(&c_key) {
            continue;
        }

        if TUP_KEYS_GENERIC_SCALAR.contains(&c_key) {
            let row = cursor.row();
            cursor.write_string(row, 0, c_key, None);
            cursor.write_duration(row, 1, doc.get(c_key), &format!("[{c_key}]"));
            cursor.advance();
        } else if TUP_KEYS_GENERIC_MAPPING.contains(&c_key) {
            let Some(dict_inner) = doc.get(c_key).and_then(Value::as_object) else {
                let c_msg = format!(
                    "{}: failed to write {} for [{c_key}]",
                    cursor.file_label(),
                    describe_value(doc.get(c_key))
                );
                cursor.warn(c_msg);
                continue;
            };
            cursor.write_string(cursor.row(), 0, c_key, None);
            if dict_inner.is_empty() {
                cursor.advance();
                continue;
            }
            for c_name in sorted_keys(dict_inner) {
                let row = cursor.row();
                cursor.write_string(row, 1, c_name.clone(), None);
                cursor.write_duration(
                    row,
                    2,
                    dict_inner.get(c_name),
                    &format!("[{c_key}][{c_name}]"),
                );
                cursor.advance();
            }
        } else {
            let c_msg = format!("{}: not sure what to do with {c_key}", cursor.file_label());
            cursor.warn(c_msg);
        }
    }
}
