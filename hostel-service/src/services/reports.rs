//! Dashboard rollups, computed on demand from the store.

use crate::models::{Hostel, PaymentFilter, PaymentStatus, StudentFilter};
use crate::services::HostelStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct HostelSummary {
    pub hostel_id: String,
    pub hostel_name: String,
    pub month: i32,
    pub year: i32,
    /// COMPLETED amounts billed in the month.
    pub revenue: Decimal,
    /// UNPAID and PENDING amounts across all periods.
    pub pending_dues: Decimal,
    pub pending_count: u64,
    pub overdue_count: u64,
    pub overdue_amount: Decimal,
    pub active_students: u64,
    pub total_rooms: u64,
    pub total_beds: i64,
    pub occupied_beds: i64,
    /// Percentage of beds taken, two decimal places.
    pub occupancy_rate: Decimal,
    pub open_complaints: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewTotals {
    pub hostels: u64,
    pub revenue: Decimal,
    pub pending_dues: Decimal,
    pub overdue_count: u64,
    pub overdue_amount: Decimal,
    pub active_students: u64,
    pub total_beds: i64,
    pub occupied_beds: i64,
    pub occupancy_rate: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct BillingOverview {
    pub month: i32,
    pub year: i32,
    pub hostels: Vec<HostelSummary>,
    pub totals: OverviewTotals,
}

fn occupancy_rate(occupied: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    let rate = Decimal::from(occupied) * Decimal::ONE_HUNDRED / Decimal::from(total);
    let mut rate = rate.round_dp(2);
    rate.rescale(2);
    rate
}

pub async fn hostel_summary(
    store: &dyn HostelStore,
    hostel: &Hostel,
    month: i32,
    year: i32,
    today: NaiveDate,
) -> Result<HostelSummary, AppError> {
    let filter = PaymentFilter {
        hostel_id: Some(hostel.id.clone()),
        ..Default::default()
    };
    let (payments, _) = store.list_payments(&filter, None).await?;

    let mut revenue = Decimal::ZERO;
    let mut pending_dues = Decimal::ZERO;
    let mut pending_count = 0;
    let mut overdue_count = 0;
    let mut overdue_amount = Decimal::ZERO;

    for payment in &payments {
        let status = payment.effective_status(today);
        if status == PaymentStatus::Completed && payment.month == month && payment.year == year {
            revenue += payment.amount;
        }
        if status.is_outstanding() {
            pending_dues += payment.amount;
            pending_count += 1;
        }
        if status == PaymentStatus::Overdue {
            overdue_count += 1;
            overdue_amount += payment.amount;
        }
    }

    let active = StudentFilter {
        is_active: Some(true),
        ..Default::default()
    };
    let active_students = store.list_students(&hostel.id, &active).await?.len() as u64;

    let rooms: Vec<_> = store
        .list_rooms(&hostel.id)
        .await?
        .into_iter()
        .filter(|r| r.is_active)
        .collect();
    let total_beds: i64 = rooms.iter().map(|r| r.capacity as i64).sum();
    let occupied_beds: i64 = rooms.iter().map(|r| r.occupied as i64).sum();

    let open_complaints = store
        .list_complaints(&hostel.id, None)
        .await?
        .iter()
        .filter(|c| c.status.is_open())
        .count() as u64;

    Ok(HostelSummary {
        hostel_id: hostel.id.clone(),
        hostel_name: hostel.name.clone(),
        month,
        year,
        revenue,
        pending_dues,
        pending_count,
        overdue_count,
        overdue_amount,
        active_students,
        total_rooms: rooms.len() as u64,
        total_beds,
        occupied_beds,
        occupancy_rate: occupancy_rate(occupied_beds, total_beds),
        open_complaints,
    })
}

pub async fn billing_overview(
    store: &dyn HostelStore,
    hostels: &[Hostel],
    month: i32,
    year: i32,
    today: NaiveDate,
) -> Result<BillingOverview, AppError> {
    let mut summaries = Vec::with_capacity(hostels.len());
    for hostel in hostels {
        summaries.push(hostel_summary(store, hostel, month, year, today).await?);
    }

    let total_beds: i64 = summaries.iter().map(|s| s.total_beds).sum();
    let occupied_beds: i64 = summaries.iter().map(|s| s.occupied_beds).sum();
    let totals = OverviewTotals {
        hostels: summaries.len() as u64,
        revenue: summaries.iter().map(|s| s.revenue).sum(),
        pending_dues: summaries.iter().map(|s| s.pending_dues).sum(),
        overdue_count: summaries.iter().map(|s| s.overdue_count).sum(),
        overdue_amount: summaries.iter().map(|s| s.overdue_amount).sum(),
        active_students: summaries.iter().map(|s| s.active_students).sum(),
        total_beds,
        occupied_beds,
        occupancy_rate: occupancy_rate(occupied_beds, total_beds),
    };

    Ok(BillingOverview {
        month,
        year,
        hostels: summaries,
        totals,
    })
}
