//! Check command - validate a scene and its samples without rendering

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use crate::render::load_samples;
use crate::scene::Scene;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Scene file
    pub scene: PathBuf,
}

/// Execute the check command
pub fn execute(args: CheckArgs) -> Result<()> {
    let lines = check(&args.scene)?;
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// Validate the scene and describe every voice
pub fn check(path: &Path) -> Result<Vec<String>> {
    let scene = Scene::load(path)?;
    scene.validate()?;

    let base = path.parent().unwrap_or(Path::new("."));
    let samples = load_samples(&scene, base)?;

    let out = &scene.output;
    let mut lines = vec![format!(
        "{}: {} frames at {}Hz, {}, {:?} mixer, block {}",
        path.display(),
        scene.frames(),
        out.sample_rate,
        if out.stereo { "stereo" } else { "mono" },
        out.mixer,
        out.block
    )];

    for (voice, sample) in scene.voice.iter().zip(&samples) {
        let frames = sample.frames() as u32;
        if let Some(region) = &voice.loop_region
            && region.end > frames
        {
            anyhow::bail!(
                "{}: loop end {} beyond {} frames",
                voice.sample,
                region.end,
                frames
            );
        }
        let rate = voice.rate.unwrap_or(sample.sample_rate);
        lines.push(format!(
            "  {}: {} frames, {} ch, plays at {}Hz, vol {} pan {}",
            voice.sample, frames, sample.channels, rate, voice.volume, voice.pan
        ));
    }

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::write_wav;

    #[test]
    fn test_check_reports_voices() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), &[0i16; 20], 2, 11025).unwrap();
        let scene_path = dir.path().join("scene.toml");
        std::fs::write(
            &scene_path,
            r#"
[[voice]]
sample = "a.wav"
pan = 12
"#,
        )
        .unwrap();

        let lines = check(&scene_path).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("a.wav: 10 frames, 2 ch, plays at 11025Hz"));
    }

    #[test]
    fn test_check_rejects_loop_past_end() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), &[0i16; 20], 1, 8000).unwrap();
        let scene_path = dir.path().join("scene.toml");
        std::fs::write(
            &scene_path,
            r#"
[[voice]]
sample = "a.wav"
[voice.loop]
start = 4
end = 30
"#,
        )
        .unwrap();

        let err = check(&scene_path).unwrap_err();
        assert!(err.to_string().contains("loop end 30 beyond 20 frames"));
    }

    #[test]
    fn test_check_missing_sample() {
        let dir = tempfile::tempdir().unwrap();
        let scene_path = dir.path().join("scene.toml");
        std::fs::write(&scene_path, "[[voice]]\nsample = \"gone.wav\"\n").unwrap();
        assert!(check(&scene_path).is_err());
    }
}
