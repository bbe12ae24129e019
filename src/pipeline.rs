use anyhow::{anyhow, Context, Result};
use std::{fs, path::Path};

use caption_convtr::{CaptionSet, Format};

use crate::{cli::ConvertCmd, config::Config};

pub fn run_convert(cmd: ConvertCmd, mut cfg: Config) -> Result<()> {
    let span = tracing::info_span!("convert", input = cmd.input.as_str(), to = ?cmd.to);
    let _g = span.enter();

    apply_cli_overrides(&cmd, &mut cfg);

    let raw = read_input(&cmd.input)?;
    tracing::info!(bytes = raw.len(), "read input");

    let input_format = select_input_format(&cmd, &raw)?;
    tracing::info!(?input_format, "input format selected");

    let mut set = caption_convtr::read_bytes(&raw, input_format, &cfg.read_options())
        .with_context(|| format!("failed parsing input as {input_format:?}"))?;

    apply_policies(&mut set, &cfg);

    log_caption_summary(&set, &cfg);

    let rendered = caption_convtr::write(&set, cmd.to, &cfg.write_options())
        .with_context(|| format!("failed rendering output as {:?}", cmd.to))?;

    if cmd.stdout {
        print!("{rendered}");
        tracing::info!(mode = "stdout", "wrote output");
        return Ok(());
    }

    let out_path = derive_output_path(&cmd)?;
    write_output(&out_path, &rendered, cmd.overwrite)?;
    tracing::info!(path = out_path.as_str(), "wrote output file");

    Ok(())
}

fn apply_cli_overrides(cmd: &ConvertCmd, cfg: &mut Config) {
    if let Some(lang) = &cmd.lang {
        cfg.policy.language = Some(lang.clone());
    }
    if let Some(offset) = cmd.offset_ms {
        cfg.policy.time_offset_ms = offset;
    }
    if cmd.simulate_roll_up {
        cfg.formats.scc.simulate_roll_up = true;
    }
}

fn select_input_format(cmd: &ConvertCmd, raw: &[u8]) -> Result<Format> {
    if let Some(f) = cmd.from {
        return Ok(f);
    }

    if cmd.input != "-" {
        let by_ext = Path::new(&cmd.input)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension)
            .filter(|f| f.can_read());
        if let Some(f) = by_ext {
            return Ok(f);
        }
    }

    let head = String::from_utf8_lossy(&raw[..raw.len().min(4096)]);
    Format::detect(&head).ok_or_else(|| {
        anyhow!("could not infer the input format of {} (pass --from)", cmd.input)
    })
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        use std::io::Read;
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed reading stdin")?;
        Ok(buf)
    } else {
        fs::read(input).with_context(|| format!("failed reading input file: {input}"))
    }
}

fn apply_policies(set: &mut CaptionSet, cfg: &Config) {
    let span = tracing::info_span!("apply_policies");
    let _g = span.enter();

    if !cfg.policy.trim_text && !cfg.policy.normalize_whitespace {
        return;
    }

    let langs: Vec<String> = set.languages().map(str::to_string).collect();
    for lang in langs {
        let Some(captions) = set.captions_mut(&lang) else {
            continue;
        };
        for c in captions.iter_mut() {
            if cfg.policy.normalize_whitespace {
                c.collapse_whitespace();
            }
            if cfg.policy.trim_text {
                c.trim_lines();
            }
        }
        let before = captions.len();
        captions.retain(|c| c.has_text());
        if captions.len() != before {
            tracing::debug!(
                lang = lang.as_str(),
                dropped = before - captions.len(),
                "dropped captions left empty"
            );
        }
    }
}

fn log_caption_summary(set: &CaptionSet, cfg: &Config) {
    tracing::info!(
        languages = set.languages().count(),
        captions = set.caption_count(),
        duration_us = set.duration_us(),
        "caption summary"
    );

    if tracing::enabled!(tracing::Level::DEBUG) {
        for lang in set.languages() {
            let captions = set.captions(lang);
            let n = cfg.logging.debug_caption_samples.min(captions.len());
            for (i, c) in captions.iter().take(n).enumerate() {
                tracing::debug!(
                    lang,
                    idx = i,
                    start_us = c.start,
                    end_us = c.end,
                    chars = c.text().chars().count(),
                    "caption sample"
                );
            }
        }
    }
}

fn derive_output_path(cmd: &ConvertCmd) -> Result<String> {
    if let Some(o) = &cmd.output {
        return Ok(o.clone());
    }

    if cmd.input == "-" {
        return Err(anyhow!(
            "output path required when input is stdin and --stdout is not set"
        ));
    }

    let p = Path::new(&cmd.input);
    let stem = p
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("bad input filename"))?;

    let parent = p.parent().unwrap_or_else(|| Path::new("."));
    let out = parent.join(format!("{stem}.{}", cmd.to.extension()));
    Ok(out.to_string_lossy().to_string())
}

fn write_output(path: &str, data: &str, overwrite: bool) -> Result<()> {
    if Path::new(path).exists() && !overwrite {
        return Err(anyhow!(
            "refusing to overwrite existing file (pass --overwrite): {path}"
        ));
    }
    fs::write(path, data).with_context(|| format!("failed writing output file: {path}"))?;
    Ok(())
}
