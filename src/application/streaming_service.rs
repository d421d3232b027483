// Streaming analysis service - Progressive delivery of a recording's analysis
use crate::application::analysis_service::AnalysisService;
use crate::domain::balance::BalanceReport;
use crate::domain::chart::SeriesData;
use crate::domain::jump::JumpEvent;
use crate::domain::recording::RecordingSummary;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub enum AnalysisMessage {
    Skeleton {
        recording: RecordingSummary,
        flexion_charts: Vec<String>,
        speed_charts: Vec<String>,
        max_points: usize,
    },
    ChartUpdate(SeriesData),
    JumpUpdate {
        joint: String,
        events: Vec<JumpEvent>,
    },
    BalanceUpdate(Option<BalanceReport>),
    Complete {
        widgets: usize,
        duration_ms: i64,
    },
    Failed {
        message: String,
    },
}

#[derive(Clone)]
pub struct StreamingAnalysisService {
    analysis: AnalysisService,
    speed_keypoints: Vec<String>,
}

impl StreamingAnalysisService {
    pub fn new(analysis: AnalysisService, speed_keypoints: Vec<String>) -> Self {
        Self {
            analysis,
            speed_keypoints,
        }
    }

    pub async fn stream_analysis(
        &self,
        recording_id: &str,
        max_points: usize,
    ) -> mpsc::Receiver<AnalysisMessage> {
        let (tx, rx) = mpsc::channel(100);
        let start_time = Instant::now();

        let recording = match self.analysis.load(recording_id).await {
            Ok(recording) => recording,
            Err(e) => {
                tracing::warn!("Cannot stream analysis for {}: {}", recording_id, e);
                let _ = tx
                    .send(AnalysisMessage::Failed {
                        message: e.to_string(),
                    })
                    .await;
                return rx;
            }
        };

        // 1. Skeleton first, so the client can lay out its charts
        let joints = recording.joints();
        let speed_charts: Vec<String> = self
            .speed_keypoints
            .iter()
            .filter(|kp| recording.frames.iter().any(|f| f.keypoint(kp).is_some()))
            .cloned()
            .collect();

        let summary = recording.summary();
        let _ = tx
            .send(AnalysisMessage::Skeleton {
                recording: summary,
                flexion_charts: joints.clone(),
                speed_charts: speed_charts.clone(),
                max_points,
            })
            .await;

        // Detection, LTTB and FFT are CPU-bound, so each widget runs on the
        // blocking pool and reports through `blocking_send`.
        let mut tasks = JoinSet::new();

        // 2. One task per joint: downsampled flexion chart, then its jumps
        for joint in joints {
            let tx = tx.clone();
            let analysis = self.analysis.clone();
            let recording = recording.clone();

            tasks.spawn_blocking(move || {
                let chart = analysis.flexion_series(&recording, &joint, max_points);
                let _ = tx.blocking_send(AnalysisMessage::ChartUpdate(chart));

                let events = analysis.jumps_for(&recording, &joint);
                let _ = tx.blocking_send(AnalysisMessage::JumpUpdate { joint, events });
                2
            });
        }

        // 3. Keypoint speed charts
        for keypoint in speed_charts {
            let tx = tx.clone();
            let analysis = self.analysis.clone();
            let recording = recording.clone();

            tasks.spawn_blocking(move || {
                let chart = analysis.speed_series(&recording, &keypoint, max_points);
                let _ = tx.blocking_send(AnalysisMessage::ChartUpdate(chart));
                1
            });
        }

        // 4. Balance summary
        {
            let tx = tx.clone();
            let analysis = self.analysis.clone();
            let recording = recording.clone();

            tasks.spawn_blocking(move || {
                let report = analysis.balance_for(&recording);
                let _ = tx.blocking_send(AnalysisMessage::BalanceUpdate(report));
                1
            });
        }

        // 5. Completion once every task has reported
        tokio::spawn(async move {
            let mut widgets = 0;
            while let Some(result) = tasks.join_next().await {
                match result {
                    Ok(sent) => widgets += sent,
                    Err(e) => tracing::error!("Analysis task failed: {}", e),
                }
            }

            let duration_ms = start_time.elapsed().as_millis() as i64;
            tracing::debug!("Analysis stream finished: {} widgets in {}ms", widgets, duration_ms);
            let _ = tx.send(AnalysisMessage::Complete { widgets, duration_ms }).await;
        });

        rx
    }
}
