use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{CaptionError, Result},
    formats::ReadOptions,
    model::CaptionSet,
};

const SCHEMA: &str = "caption-convtr.caption_set";
const VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedJson {
    pub schema: String,
    pub version: u32,
    pub caption_set: CaptionSet,
}

pub fn write_json(set: &CaptionSet, wrapped: bool) -> Result<String> {
    if wrapped {
        let w = WrappedJson {
            schema: SCHEMA.to_string(),
            version: VERSION,
            caption_set: set.clone(),
        };
        Ok(serde_json::to_string_pretty(&w)?)
    } else {
        Ok(serde_json::to_string_pretty(set)?)
    }
}

pub fn read_json(input: &str, opts: &ReadOptions) -> Result<CaptionSet> {
    let v: Value = serde_json::from_str(input)?;

    let mut set: CaptionSet = if let Some(schema) = v.get("schema").and_then(Value::as_str) {
        if schema != SCHEMA {
            return Err(CaptionError::InvalidFormat(format!(
                "unsupported JSON schema '{schema}'"
            )));
        }
        let wrapped: WrappedJson = serde_json::from_value(v)?;
        wrapped.caption_set
    } else if v.get("captions").is_some() {
        serde_json::from_value(v)?
    } else {
        return Err(CaptionError::InvalidFormat(
            "unrecognized JSON caption shape".to_string(),
        ));
    };

    if set.is_empty() {
        return Err(CaptionError::NoCaptions("JSON caption set is empty".to_string()));
    }
    if opts.offset_us != 0 {
        set.adjust_timing(-opts.offset_us, 1.0);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Caption, CaptionNode, Style};

    fn sample() -> CaptionSet {
        let mut set = CaptionSet::with_language(
            "en",
            vec![Caption::new(
                1_000_000,
                2_000_000,
                vec![
                    CaptionNode::italics(true),
                    CaptionNode::text("hi"),
                    CaptionNode::italics(false),
                ],
            )],
        );
        set.set_style("speaker", Style::color("red"));
        set
    }

    #[test]
    fn wrapped_and_bare_shapes_load() {
        let set = sample();
        for wrapped in [true, false] {
            let json = write_json(&set, wrapped).unwrap();
            assert_eq!(json.contains("\"schema\""), wrapped);
            let back = read_json(&json, &ReadOptions::default()).unwrap();
            assert_eq!(back, set);
        }
    }

    #[test]
    fn node_tags_are_readable() {
        let json = write_json(&sample(), false).unwrap();
        assert!(json.contains("\"type\": \"style\""));
        assert!(json.contains("\"content\": \"hi\""));
    }

    #[test]
    fn rejects_foreign_shapes() {
        let err = read_json("{\"cues\": []}", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, CaptionError::InvalidFormat(_)));
        let err = read_json("{\"captions\": {}}", &ReadOptions::default()).unwrap_err();
        assert!(err.is_no_captions());
        assert!(matches!(
            read_json("not json", &ReadOptions::default()),
            Err(CaptionError::Json(_))
        ));
    }
}
