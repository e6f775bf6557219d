//! Text pose files: one pose per line, the last seven tokens being
//! `p.x p.y p.z q.x q.y q.z q.w`. Leading tokens (frame id, timestamp) are
//! ignored, as are blank lines and lines starting with `#`.

use crate::error::ViewerError;
use crate::structures::{CameraPose, Position, Quaternion};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

const POSE_TOKENS: usize = 7;

#[inline]
fn next_line<'b>(buffer: &'b [u8], offset: &mut usize) -> Option<&'b [u8]> {
    if *offset >= buffer.len() {
        return None;
    }
    let start = *offset;

    match memchr::memchr(b'\n', &buffer[*offset..]) {
        Some(pos) => {
            *offset = start + pos + 1;
            Some(&buffer[start..start + pos])
        }
        None => {
            *offset = buffer.len();
            Some(&buffer[start..])
        }
    }
}

fn parse_pose_line(line: &str, line_no: usize) -> Result<CameraPose, ViewerError> {
    let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
    if tokens.len() < POSE_TOKENS {
        return Err(ViewerError::ParsePose {
            line: line_no,
            reason: format!(
                "expected at least {} values, found {}",
                POSE_TOKENS,
                tokens.len()
            ),
        });
    }

    let mut values = [0.0f32; POSE_TOKENS];
    for (value, token) in values
        .iter_mut()
        .zip(&tokens[tokens.len() - POSE_TOKENS..])
    {
        *value = token.parse().map_err(|e| ViewerError::ParsePose {
            line: line_no,
            reason: format!("'{}' is not a number: {}", token, e),
        })?;
    }

    let [px, py, pz, qx, qy, qz, qw] = values;
    Ok(CameraPose::new(
        Position::new(px, py, pz),
        Quaternion::new(qx, qy, qz, qw),
    ))
}

/// Parses a whole pose file held in memory. Line numbers in errors are 1-based.
pub fn parse_poses(raw_data: &[u8]) -> Result<Vec<CameraPose>, ViewerError> {
    let mut offset = 0;
    let mut line_no = 0;
    let mut poses = Vec::new();

    while let Some(raw_line) = next_line(raw_data, &mut offset) {
        line_no += 1;
        let line = std::str::from_utf8(raw_line).map_err(|e| ViewerError::ParsePose {
            line: line_no,
            reason: format!("UTF-8 error: {}", e),
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        poses.push(parse_pose_line(line, line_no)?);
    }

    debug!("Parsed {} poses from {} lines", poses.len(), line_no);
    Ok(poses)
}

#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_poses(path: impl AsRef<Path>) -> Result<Vec<CameraPose>, ViewerError> {
    let raw_data = fs::read(path.as_ref())?;
    let poses = parse_poses(&raw_data)?;
    info!("Loaded {} camera poses", poses.len());
    Ok(poses)
}
