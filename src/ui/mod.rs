use std::io::{self, Write};

use anyhow::{Error, Result};

use crate::core::UpdateManifest;

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "Error: {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "Caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }
}

/// Serializes `manifest` as one JSON document followed by a newline.
///
/// The document is fully encoded before anything is written, so a failed
/// encode leaves `out` untouched.
pub fn write_manifest(out: &mut dyn Write, manifest: &UpdateManifest, pretty: bool) -> Result<()> {
    let mut buf = if pretty {
        serde_json::to_vec_pretty(manifest)?
    } else {
        serde_json::to_vec(manifest)?
    };
    buf.push(b'\n');

    out.write_all(&buf)?;
    out.flush()?;
    Ok(())
}
