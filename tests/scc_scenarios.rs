use caption_convtr::{
    read, CaptionError, DebouncePolicy, Format, ReadOptions, SccOptions,
};

const HEADER: &str = "Scenarist_SCC V1.0";

fn doc(body: &str) -> String {
    format!("{HEADER}\n\n{body}\n")
}

fn texts(content: &str, opts: &ReadOptions) -> Vec<String> {
    read(content, Format::Scc, opts)
        .unwrap()
        .captions("en-US")
        .iter()
        .map(|c| c.text())
        .collect()
}

#[test]
fn pop_on_caption_without_clear_lasts_four_seconds() {
    let set = read(
        &doc("00:00:01:00\t9420 9420 9470 9470 68e9 942f 942f"),
        Format::Scc,
        &ReadOptions::default(),
    )
    .unwrap();
    let caps = set.captions("en-US");
    assert_eq!(caps.len(), 1);
    assert_eq!(caps[0].text(), "hi");
    // EOC is the sixth word; non-drop timecode runs 1.001 slow
    assert!((1_001_000..=1_200_000).contains(&caps[0].start), "{}", caps[0].start);
    assert_eq!(caps[0].end, caps[0].start + 4_000_000);
}

#[test]
fn simulated_roll_up_keeps_two_rows_on_screen() {
    let body = "00:00:01;00\t9425 9425 9470 9470 4c31 94ad 94ad\n\n\
                00:00:02;00\t9470 9470 4c32 94ad 94ad\n\n\
                00:00:03;00\t9470 9470 4cb3 94ad 94ad";
    let opts = ReadOptions {
        scc: SccOptions {
            simulate_roll_up: true,
            ..SccOptions::default()
        },
        ..ReadOptions::default()
    };
    let set = read(&doc(body), Format::Scc, &opts).unwrap();
    let caps = set.captions("en-US");
    let texts: Vec<String> = caps.iter().map(|c| c.text()).collect();
    assert_eq!(texts, ["L1", "L1 L2", "L2 L3"]);
    assert_eq!(caps[0].start, 1_000_000);
    assert_eq!(caps[0].end, caps[1].start);
    assert_eq!(caps[1].end, caps[2].start);
    assert!(caps.iter().all(|c| !c.is_open()));

    let plain = texts_of_default(body);
    assert_eq!(plain, ["L1", "L2", "L3"]);
}

fn texts_of_default(body: &str) -> Vec<String> {
    texts(&doc(body), &ReadOptions::default())
}

#[test]
fn implausibly_short_caption_is_rejected() {
    let err = read(
        &doc("00:00:01:00\t9420 9470 68e9 942f\n\n00:00:01:04\t942c"),
        Format::Scc,
        &ReadOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CaptionError::InvalidFormat(_)), "{err}");
}

#[test]
fn doubled_commands_act_once() {
    let doubled = texts_of_default("00:00:01;00\t9420 9420 9470 9470 68e9 942f 942f");
    let single = texts_of_default("00:00:01;00\t9420 9470 68e9 942f");
    assert_eq!(doubled, ["hi"]);
    assert_eq!(doubled, single);
}

#[test]
fn doubled_special_characters_follow_the_policy() {
    let body = "00:00:01;00\t9420 9470 9137 9137 942f";
    assert_eq!(texts_of_default(body), ["♪"]);

    let opts = ReadOptions {
        scc: SccOptions {
            debounce: DebouncePolicy::CommandsOnly,
            ..SccOptions::default()
        },
        ..ReadOptions::default()
    };
    assert_eq!(texts(&doc(body), &opts), ["♪♪"]);
}

#[test]
fn commands_only_document_has_no_captions() {
    let err = read(
        &doc("00:00:01;00\t94ae 94ae 9420 9420 942c 942c 942f 942f"),
        Format::Scc,
        &ReadOptions::default(),
    )
    .unwrap_err();
    assert!(err.is_no_captions());
}

#[test]
fn second_row_becomes_a_line_break() {
    let caps = texts_of_default("00:00:01;00\t9420 9440 f2ef f731 9470 f2ef f732 942f");
    assert_eq!(caps, ["row1\nrow2"]);
}

#[test]
fn offset_and_language_are_applied() {
    let opts = ReadOptions {
        language: Some("es".to_string()),
        offset_us: 500_000,
        ..ReadOptions::default()
    };
    let set = read(&doc("00:00:02;00\t9420 9470 68e9 942f\n\n00:00:04;00\t942c"), Format::Scc, &opts)
        .unwrap();
    let caps = set.captions("es");
    assert_eq!(caps.len(), 1);
    assert_eq!(caps[0].start, 1_600_000);
    assert_eq!(caps[0].end, 3_500_000);
}

#[test]
fn lower_row_in_next_caption_converts_to_a_clean_srt_cue() {
    let set = read(
        &doc("00:00:01;00\t9420 94d0 68e9 942f\n\n\
              00:00:03;00\t942c 9420 9470 ef6b 942f\n\n\
              00:00:05;00\t942c"),
        Format::Scc,
        &ReadOptions::default(),
    )
    .unwrap();
    let srt = caption_convtr::write(&set, Format::Srt, &caption_convtr::WriteOptions::default())
        .unwrap();
    assert!(srt.contains("\nok\n\n"), "{srt}");
    for cue in srt.split("\n\n").filter(|b| !b.is_empty()) {
        let first_text = cue.lines().nth(2).unwrap_or_default();
        assert!(!first_text.is_empty(), "{srt}");
    }
    assert!(set.captions("en-US").iter().all(|c| c.end >= c.start));
}
