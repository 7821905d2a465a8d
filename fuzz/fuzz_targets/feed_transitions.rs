#![no_main]

use dungeoneer::feed::{Feed, FeedPhase, FetchRequest};
use dungeoneer::model::Page;
use libfuzzer_sys::arbitrary::{self, Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone)]
enum Event {
    SentinelVisible,
    DeliverPage { rows: u8, has_more: bool },
    DeliverError,
    Invalidate,
}

impl<'a> Arbitrary<'a> for Event {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let kind: u8 = u.int_in_range(0..=3)?;

        Ok(match kind {
            0 => Event::SentinelVisible,
            1 => Event::DeliverPage {
                rows: u.int_in_range(0..=12)?,
                has_more: u.arbitrary()?,
            },
            2 => Event::DeliverError,
            3 => Event::Invalidate,
            _ => unreachable!(),
        })
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let mut u = Unstructured::new(data);

    // Generate a sequence of UI events
    let mut events = Vec::new();
    while let Ok(event) = Event::arbitrary(&mut u) {
        events.push(event);
        if events.len() >= 64 {
            break;
        }
    }

    if events.is_empty() {
        return;
    }

    let first = Page {
        items: vec![0u32, 1, 2],
        next_cursor: Some("v1.MA".to_string()),
    };
    let mut feed = Feed::seeded(3, first);

    // Requests the UI has issued but not resolved yet. Invalidation leaves
    // old entries in place so late deliveries exercise the stale-drop path.
    let mut pending: Vec<FetchRequest> = Vec::new();
    let mut serial = 0u32;

    for event in events {
        let len_before = feed.len();
        let invalidated = matches!(event, Event::Invalidate);

        match event {
            Event::SentinelVisible => {
                if let Some(request) = feed.sentinel_visible() {
                    pending.push(request);
                }
            }
            Event::DeliverPage { rows, has_more } => {
                if pending.is_empty() {
                    continue;
                }
                let request = pending.remove(0);
                let items = (0..u32::from(rows)).map(|_| {
                    serial += 1;
                    serial
                });
                feed.complete(
                    &request,
                    Page {
                        items: items.collect(),
                        next_cursor: has_more.then(|| format!("v1.{serial}")),
                    },
                );
            }
            Event::DeliverError => {
                if pending.is_empty() {
                    continue;
                }
                let request = pending.remove(0);
                feed.fail(&request, "fetch failed");
            }
            Event::Invalidate => {
                pending.push(feed.invalidate());
            }
        }

        match feed.phase() {
            FeedPhase::Errored => assert!(feed.error().is_some()),
            FeedPhase::Exhausted => assert!(!feed.has_next()),
            _ => {}
        }

        // Only an invalidation may shrink the list; stale deliveries are
        // dropped without touching it.
        if !invalidated {
            assert!(feed.len() >= len_before);
        }
    }
});
