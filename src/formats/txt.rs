use crate::{
    formats::{select_language, time::format_vtt_timestamp, TranscriptMode, WriteOptions},
    model::CaptionSet,
};

pub fn write_txt(set: &CaptionSet, opts: &WriteOptions) -> String {
    let mut out = String::new();
    let Some(lang) = select_language(set, opts.language.as_deref()) else {
        return out;
    };

    for caption in set.captions(lang) {
        let text = caption.text().split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }
        if opts.txt_mode == TranscriptMode::TimestampRange {
            out.push_str(&format!(
                "[{} --> {}] ",
                format_vtt_timestamp(caption.start),
                format_vtt_timestamp(caption.end),
            ));
        }
        out.push_str(&text);
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Caption, CaptionNode};

    fn set() -> CaptionSet {
        CaptionSet::with_language(
            "en",
            vec![
                Caption::new(
                    1_000_000,
                    2_000_000,
                    vec![
                        CaptionNode::text("one"),
                        CaptionNode::Break,
                        CaptionNode::text("two"),
                    ],
                ),
                Caption::new(3_000_000, 4_000_000, vec![CaptionNode::Break]),
            ],
        )
    }

    #[test]
    fn timestamp_range_lines() {
        assert_eq!(
            write_txt(&set(), &WriteOptions::default()),
            "[00:00:01.000 --> 00:00:02.000] one two\n"
        );
    }

    #[test]
    fn text_only_lines() {
        let opts = WriteOptions {
            txt_mode: TranscriptMode::TextOnly,
            ..WriteOptions::default()
        };
        assert_eq!(write_txt(&set(), &opts), "one two\n");
    }
}
