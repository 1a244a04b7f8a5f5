//! Integration tests for the fetch/enrich/notify cycle
//!
//! Tests cover:
//! - Traffic and weather fetched concurrently for the submitted timestamp
//! - Geo-join and street names applied to the held camera list
//! - Notifications for success, failure and empty snapshots
//! - Superseded submissions never reach the view

mod helpers;

use chrono::{NaiveDate, NaiveTime};
use helpers::*;
use meteor_common::events::MeteorEvent;
use std::sync::Arc;
use tokio::sync::Notify;

const TS_MORNING: &str = "2023-03-14T09:26:00";
const TS_EVENING: &str = "2023-03-14T18:05:00";

fn morning() -> (NaiveDate, NaiveTime) {
    (
        NaiveDate::from_ymd_opt(2023, 3, 14).unwrap(),
        NaiveTime::from_hms_opt(9, 26, 41).unwrap(),
    )
}

fn evening() -> (NaiveDate, NaiveTime) {
    (
        NaiveDate::from_ymd_opt(2023, 3, 14).unwrap(),
        NaiveTime::from_hms_opt(18, 5, 0).unwrap(),
    )
}

fn is_fetched(event: &MeteorEvent, count: usize) -> bool {
    matches!(event, MeteorEvent::TrafficFetched { camera_count, .. } if *camera_count == count)
}

#[tokio::test]
async fn test_bishan_camera_enriched_end_to_end() {
    let traffic = MockTraffic::new().reply(
        TS_MORNING,
        TrafficReply::Cameras(vec![
            camera("1701", 1.30001, 103.80005),
            camera("1702", 1.40000, 103.90000),
        ]),
    );
    let weather = MockWeather::new().reply(TS_MORNING, bishan_weather("Cloudy"));
    let geocoder = MockGeocoder::new(&[(1.30001, "Bishan Road"), (1.4, "Punggol Road")]);
    let dashboard = dashboard(traffic, weather, Some(geocoder));
    let mut rx = dashboard.event_bus().subscribe();

    let (date, time) = morning();
    let handles = dashboard.submit(date, time).await;
    assert_eq!(handles.timestamp, TS_MORNING);
    handles.wait().await;

    let view = dashboard.view().await;
    assert!(view.has_camera_data);
    assert_eq!(view.rows.len(), 2);

    let bishan = &view.rows[0];
    assert_eq!(bishan.camera_id, "1701");
    assert_eq!(bishan.area.as_deref(), Some("Bishan"));
    assert_eq!(bishan.forecast.as_deref(), Some("Cloudy"));
    assert_eq!(bishan.street.as_deref(), Some("Bishan Road"));

    let far = &view.rows[1];
    assert_eq!(far.area, None);
    assert_eq!(far.forecast, None);
    assert_eq!(far.street.as_deref(), Some("Punggol Road"));

    let events = drain(&mut rx);
    assert_eq!(events.iter().filter(|e| is_fetched(e, 2)).count(), 1);
    assert!(events
        .iter()
        .all(|e| !matches!(e, MeteorEvent::TrafficFetchFailed { .. } | MeteorEvent::WeatherFetchFailed { .. })));
}

#[tokio::test]
async fn test_empty_snapshot_notifies_and_clears() {
    let traffic = MockTraffic::new()
        .reply(TS_MORNING, TrafficReply::Cameras(vec![camera("1701", 1.3, 103.8)]))
        .reply(TS_EVENING, TrafficReply::Empty);
    let weather = MockWeather::new()
        .reply(TS_MORNING, bishan_weather("Cloudy"))
        .reply(TS_EVENING, bishan_weather("Fair"));
    let dashboard = dashboard(traffic, weather, None);

    let (date, time) = morning();
    dashboard.submit(date, time).await.wait().await;
    assert!(dashboard.view().await.has_camera_data);

    let mut rx = dashboard.event_bus().subscribe();
    let (date, time) = evening();
    dashboard.submit(date, time).await.wait().await;

    let view = dashboard.view().await;
    assert!(!view.has_camera_data);
    assert!(view.rows.is_empty());

    let events = drain(&mut rx);
    let notice = events
        .iter()
        .find(|e| matches!(e, MeteorEvent::NoTrafficData { .. }))
        .and_then(|e| e.notice())
        .expect("NoTrafficData emitted");
    assert_eq!(notice.1, "No traffic data available for this date and time.");
    assert!(!events.iter().any(|e| matches!(e, MeteorEvent::TrafficFetched { .. })));
}

#[tokio::test]
async fn test_traffic_failure_keeps_enriched_rows() {
    let traffic = MockTraffic::new()
        .reply(
            TS_MORNING,
            TrafficReply::Cameras(vec![camera("1701", 1.3, 103.8), camera("1702", 1.4, 103.9)]),
        )
        .reply(TS_EVENING, TrafficReply::Fail);
    let weather = MockWeather::new()
        .reply(TS_MORNING, bishan_weather("Cloudy"))
        .reply(TS_EVENING, bishan_weather("Thundery Showers"));
    let dashboard = dashboard(traffic, weather, None);

    let (date, time) = morning();
    dashboard.submit(date, time).await.wait().await;
    let before = dashboard.view().await.rows;
    assert_eq!(before[0].area.as_deref(), Some("Bishan"));
    assert_eq!(before[0].forecast.as_deref(), Some("Cloudy"));

    let mut rx = dashboard.event_bus().subscribe();
    let (date, time) = evening();
    dashboard.submit(date, time).await.wait().await;

    let view = dashboard.view().await;
    assert_eq!(view.timestamp, TS_EVENING);
    // evening weather arrived, but the morning rows keep their morning join
    assert_eq!(view.rows, before);

    let events = drain(&mut rx);
    let failure = events
        .iter()
        .find(|e| matches!(e, MeteorEvent::TrafficFetchFailed { .. }))
        .expect("TrafficFetchFailed emitted");
    assert_eq!(
        failure.notice().map(|(_, message)| message),
        Some("Error fetching traffic data. Please try again later.")
    );
}

#[tokio::test]
async fn test_weather_failure_notifies_and_keeps_cameras() {
    let traffic = MockTraffic::new().reply(
        TS_MORNING,
        TrafficReply::Cameras(vec![camera("1701", 1.30001, 103.80005)]),
    );
    let dashboard = dashboard(traffic, MockWeather::new(), None);
    let mut rx = dashboard.event_bus().subscribe();

    let (date, time) = morning();
    dashboard.submit(date, time).await.wait().await;

    let view = dashboard.view().await;
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].area, None);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| matches!(e, MeteorEvent::WeatherFetchFailed { .. })));
    assert!(events.iter().any(|e| is_fetched(e, 1)));
}

#[tokio::test]
async fn test_geocode_failure_is_silent() {
    let traffic = MockTraffic::new().reply(
        TS_MORNING,
        TrafficReply::Cameras(vec![camera("1701", 1.3, 103.8), camera("1702", 1.4, 103.9)]),
    );
    let weather = MockWeather::new().reply(TS_MORNING, bishan_weather("Cloudy"));
    let geocoder = MockGeocoder::new(&[(1.3, "Bishan Road")]);
    let dashboard = dashboard(traffic, weather, Some(geocoder));
    let mut rx = dashboard.event_bus().subscribe();

    let (date, time) = morning();
    dashboard.submit(date, time).await.wait().await;

    let view = dashboard.view().await;
    assert_eq!(view.rows[0].street.as_deref(), Some("Bishan Road"));
    assert_eq!(view.rows[1].street, None);

    // only the success notice; geocoding failures never notify
    let notices: Vec<_> = drain(&mut rx).iter().filter_map(|e| e.notice()).collect();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].1, "Traffic data fetched successfully.");
}

#[tokio::test]
async fn test_superseded_submission_discarded() {
    let gate = Arc::new(Notify::new());
    let traffic = MockTraffic::new()
        .reply(TS_MORNING, TrafficReply::Cameras(vec![camera("old", 1.3, 103.8)]))
        .hold(TS_MORNING, gate.clone())
        .reply(TS_EVENING, TrafficReply::Cameras(vec![camera("new", 1.30001, 103.80005)]));
    let weather = MockWeather::new()
        .reply(TS_MORNING, bishan_weather("Cloudy"))
        .reply(TS_EVENING, bishan_weather("Fair"));
    let dashboard = dashboard(traffic, weather, None);
    let mut rx = dashboard.event_bus().subscribe();

    let (date, time) = morning();
    let first = dashboard.submit(date, time).await;
    let (date, time) = evening();
    let second = dashboard.submit(date, time).await;

    second.wait().await;
    gate.notify_one();
    first.wait().await;

    let view = dashboard.view().await;
    assert_eq!(view.timestamp, TS_EVENING);
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].camera_id, "new");
    assert_eq!(view.rows[0].forecast.as_deref(), Some("Fair"));

    let events = drain(&mut rx);
    assert!(events.iter().all(|e| match e {
        MeteorEvent::TrafficFetched { timestamp, .. } => timestamp == TS_EVENING,
        _ => true,
    }));
}

#[tokio::test]
async fn test_submit_clears_selection() {
    let traffic = MockTraffic::new()
        .reply(TS_MORNING, TrafficReply::Cameras(vec![camera("1701", 1.3, 103.8)]))
        .reply(TS_EVENING, TrafficReply::Cameras(vec![camera("1701", 1.3, 103.8)]));
    let weather = MockWeather::new()
        .reply(TS_MORNING, bishan_weather("Cloudy"))
        .reply(TS_EVENING, bishan_weather("Fair"));
    let dashboard = dashboard(traffic, weather, None);

    let (date, time) = morning();
    dashboard.submit(date, time).await.wait().await;
    assert!(dashboard.select("1701").await);
    assert_eq!(
        dashboard.selected_camera().await.and_then(|c| c.forecast).as_deref(),
        Some("Cloudy")
    );

    let (date, time) = evening();
    let handles = dashboard.submit(date, time).await;
    assert_eq!(dashboard.view().await.selection, None);
    handles.wait().await;

    assert!(dashboard.selected_camera().await.is_none());
    let view = dashboard.view().await;
    assert_eq!(view.selected_date, Some(date));
    assert_eq!(view.selected_time, Some(time));
}

#[tokio::test]
async fn test_refresh_at_uses_given_timestamp() {
    let traffic = MockTraffic::new()
        .reply(TS_MORNING, TrafficReply::Cameras(vec![camera("1701", 1.3, 103.8)]));
    let weather = MockWeather::new().reply(TS_MORNING, bishan_weather("Cloudy"));
    let dashboard = dashboard(traffic, weather, None);

    let handles = dashboard.refresh_at(TS_MORNING.to_string()).await;
    assert_eq!(handles.timestamp, TS_MORNING);
    handles.wait().await;

    let view = dashboard.view().await;
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.selected_date, None);
}
