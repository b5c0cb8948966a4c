//! Property tests for the text exposition format

use netprobe_core::{DescriptorSet, MetricDesc, Sample, render_text};
use proptest::prelude::*;

/// Reverses label value escaping
fn unescape(value: &str) -> String {
    let mut out = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

proptest! {
    #[test]
    fn prop_label_values_survive_escaping(value in any::<String>(), reading in -1.0e9f64..1.0e9) {
        let desc = MetricDesc::new("cisco_interface_up", "Interface is up", &["target", "description"]);
        let mut descriptors = DescriptorSet::new();
        descriptors.register(&desc).unwrap();
        let sample = Sample::gauge(&desc, reading, vec!["r1".to_string(), value.clone()]);

        let text = render_text(&descriptors, &[sample]).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        // HELP, TYPE, sample, trailing empty
        prop_assert_eq!(lines.len(), 4);

        let line = lines[2];
        let start = line.find("description=\"").unwrap() + "description=\"".len();
        let end = line.rfind("\"} ").unwrap();
        prop_assert_eq!(unescape(&line[start..end]), value);
        prop_assert_eq!(line[end + 3..].parse::<f64>().unwrap(), reading);
    }

    #[test]
    fn prop_samples_grouped_by_family(order in prop::collection::vec(any::<bool>(), 1..30)) {
        let up = MetricDesc::new("cisco_up", "Scrape of target was successful", &["target"]);
        let rx = MetricDesc::new("cisco_optics_rx", "Transceiver Rx power", &["target", "interface"]);
        let mut descriptors = DescriptorSet::new();
        descriptors.register_all([&up, &rx]).unwrap();

        let samples: Vec<Sample> = order
            .iter()
            .enumerate()
            .map(|(i, is_up)| {
                if *is_up {
                    Sample::gauge(&up, 1.0, vec![format!("r{i}")])
                } else {
                    Sample::gauge(&rx, -3.5, vec![format!("r{i}"), "Gi0/1".to_string()])
                }
            })
            .collect();
        let text = render_text(&descriptors, &samples).unwrap();

        let names: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| l.split('{').next().unwrap_or_default())
            .collect();
        let ups = order.iter().filter(|u| **u).count();
        prop_assert!(names[..ups].iter().all(|n| *n == "cisco_up"));
        prop_assert!(names[ups..].iter().all(|n| *n == "cisco_optics_rx"));
        prop_assert_eq!(text.matches("# TYPE").count(), usize::from(ups > 0) + usize::from(ups < order.len()));
    }
}
