use caption_convtr::{
    read, write, Caption, CaptionNode, CaptionSet, Format, ReadOptions, WriteOptions,
};

fn sample() -> CaptionSet {
    CaptionSet::with_language(
        "en-US",
        vec![
            Caption::new(1_000_000, 3_000_000, vec![CaptionNode::text("Hello world")]),
            Caption::new(
                4_000_000,
                6_000_000,
                vec![
                    CaptionNode::text("Second"),
                    CaptionNode::Break,
                    CaptionNode::text("caption"),
                ],
            ),
        ],
    )
}

#[test]
fn scc_survives_a_write_and_read() {
    let scc = write(&sample(), Format::Scc, &WriteOptions::default()).unwrap();
    let back = read(&scc, Format::Scc, &ReadOptions::default()).unwrap();

    let original = sample();
    let before = original.captions("en-US");
    let after = back.captions("en-US");
    assert_eq!(after.len(), before.len());
    for (a, b) in before.iter().zip(after) {
        assert_eq!(a.text(), b.text());
        assert!((a.start - b.start).abs() < 600_000, "{} vs {}", a.start, b.start);
        assert!((a.end - b.end).abs() < 600_000, "{} vs {}", a.end, b.end);
    }
}

#[test]
fn vtt_converts_to_srt() {
    let vtt = "WEBVTT\n\n\
               00:00:01.000 --> 00:00:02.500\n\
               Hello <i>there</i>\n\n\
               intro\n\
               00:01:00.250 --> 00:01:03.000 align:start\n\
               Two\nlines\n";
    let set = read(vtt, Format::Vtt, &ReadOptions::default()).unwrap();
    let srt = write(&set, Format::Srt, &WriteOptions::default()).unwrap();
    assert_eq!(
        srt,
        "1\n00:00:01,000 --> 00:00:02,500\nHello <i>there</i>\n\n\
         2\n00:01:00,250 --> 00:01:03,000\nTwo\nlines\n\n"
    );
}

#[test]
fn dfxp_keeps_languages_through_json() {
    let dfxp = r#"<?xml version="1.0" encoding="utf-8"?>
<tt xmlns="http://www.w3.org/ns/ttml" xml:lang="en">
  <body>
    <div xml:lang="en">
      <p begin="00:00:01.000" end="00:00:02.000">Hi</p>
    </div>
    <div xml:lang="fr">
      <p begin="00:00:01.000" end="00:00:02.000">Salut</p>
    </div>
  </body>
</tt>"#;
    let set = read(dfxp, Format::Dfxp, &ReadOptions::default()).unwrap();
    let json = write(&set, Format::Json, &WriteOptions::default()).unwrap();
    let back = read(&json, Format::Json, &ReadOptions::default()).unwrap();
    assert_eq!(back, set);
    assert_eq!(back.captions("fr")[0].text(), "Salut");
    assert_eq!(back.languages().count(), 2);
}

#[test]
fn srt_to_scc_picks_the_requested_language() {
    let mut set = sample();
    set.set_captions(
        "de",
        vec![Caption::new(1_000_000, 2_000_000, vec![CaptionNode::text("Hallo")])],
    );
    let opts = WriteOptions {
        language: Some("de".to_string()),
        ..WriteOptions::default()
    };
    let scc = write(&set, Format::Scc, &opts).unwrap();
    let back = read(&scc, Format::Scc, &ReadOptions::default()).unwrap();
    let texts: Vec<String> = back.captions("en-US").iter().map(Caption::text).collect();
    assert_eq!(texts, ["Hallo"]);
}
