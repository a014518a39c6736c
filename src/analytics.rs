use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutreachChannel {
    Email,
    Linkedin,
    #[serde(other)]
    Other,
}

/// Where an outreach attempt stands. Statuses are exact, not cumulative: a
/// hired candidate counts as hired only, not as responded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutreachStatus {
    Sent,
    Responded,
    Interviewed,
    Offered,
    Hired,
    Declined,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub candidate_id: String,
    #[serde(default)]
    pub company: String,
    pub outreach_type: OutreachChannel,
    pub status: OutreachStatus,
}

#[derive(Debug, Deserialize)]
pub struct FunnelRequest {
    #[serde(default)]
    pub records: Vec<OutreachRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunnelStage {
    pub name: &'static str,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub sent: usize,
    pub responded: usize,
    pub response_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelReport {
    pub total_outreach: usize,
    pub responded: usize,
    pub interviewed: usize,
    pub offered: usize,
    pub hired: usize,
    pub response_rate: u32,
    pub interview_rate: u32,
    pub offer_rate: u32,
    pub hire_rate: u32,
    pub conversion_rate: u32,
    pub email: ChannelStats,
    pub linkedin: ChannelStats,
    pub funnel: Vec<FunnelStage>,
}

pub fn compute_funnel(records: &[OutreachRecord]) -> FunnelReport {
    let count = |status: OutreachStatus| records.iter().filter(|r| r.status == status).count();

    let total_outreach = records.len();
    let responded = count(OutreachStatus::Responded);
    let interviewed = count(OutreachStatus::Interviewed);
    let offered = count(OutreachStatus::Offered);
    let hired = count(OutreachStatus::Hired);

    FunnelReport {
        total_outreach,
        responded,
        interviewed,
        offered,
        hired,
        response_rate: percent(responded, total_outreach),
        interview_rate: percent(interviewed, responded),
        offer_rate: percent(offered, interviewed),
        hire_rate: percent(hired, offered),
        conversion_rate: percent(hired, total_outreach),
        email: channel_stats(records, OutreachChannel::Email),
        linkedin: channel_stats(records, OutreachChannel::Linkedin),
        funnel: vec![
            FunnelStage { name: "Outreach", value: total_outreach },
            FunnelStage { name: "Responded", value: responded },
            FunnelStage { name: "Interviewed", value: interviewed },
            FunnelStage { name: "Offered", value: offered },
            FunnelStage { name: "Hired", value: hired },
        ],
    }
}

fn channel_stats(records: &[OutreachRecord], channel: OutreachChannel) -> ChannelStats {
    let sent = records.iter().filter(|r| r.outreach_type == channel).count();
    let responded = records
        .iter()
        .filter(|r| r.outreach_type == channel && r.status == OutreachStatus::Responded)
        .count();
    ChannelStats {
        sent,
        responded,
        response_rate: percent(responded, sent),
    }
}

/// Rounded percentage; zero when the denominator is zero.
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
