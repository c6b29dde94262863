use serde::Serialize;
use skysearch_shared::FlightOffer;

pub const DEFAULT_BUCKET_COUNT: usize = 5;

/// One interval of the price distribution.
/// Both bounds are inclusive, so a price sitting exactly on an internal
/// boundary is claimed by the lower bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl HistogramBucket {
    fn spanning(lower: f64, upper: f64) -> Self {
        Self {
            label: format!("${} - ${}", lower.floor() as i64, upper.floor() as i64),
            lower,
            upper,
            count: 0,
        }
    }

    pub fn contains(&self, price: f64) -> bool {
        price >= self.lower && price <= self.upper
    }
}

/// Price distribution over `DEFAULT_BUCKET_COUNT` equal-width buckets
pub fn histogram(offers: &[FlightOffer]) -> Vec<HistogramBucket> {
    build_histogram(offers, DEFAULT_BUCKET_COUNT)
}

/// Price distribution with a caller-chosen bucket count.
///
/// Offers whose price doesn't parse are left out of the distribution.
/// When every price is identical a single bucket is produced regardless of
/// `bucket_count`.
pub fn build_histogram(offers: &[FlightOffer], bucket_count: usize) -> Vec<HistogramBucket> {
    let prices: Vec<f64> = offers.iter().filter_map(|o| o.price_value()).collect();
    if prices.len() < offers.len() {
        tracing::debug!(
            "Skipping {} offers with unparsable prices in histogram",
            offers.len() - prices.len()
        );
    }
    if prices.is_empty() {
        return Vec::new();
    }

    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min == max {
        return vec![HistogramBucket {
            label: format!("${}", min.floor() as i64),
            lower: min,
            upper: max,
            count: prices.len(),
        }];
    }

    let bucket_count = bucket_count.max(1);
    let step = (max - min) / bucket_count as f64;

    let mut buckets: Vec<HistogramBucket> = (0..bucket_count)
        .map(|i| {
            let lower = min + i as f64 * step;
            HistogramBucket::spanning(lower, lower + step)
        })
        .collect();

    for price in prices {
        let idx = bucket_index(&buckets, price);
        buckets[idx].count += 1;
    }

    buckets
}

// First bucket containing the price; rounding at the top of the range falls through to the last.
fn bucket_index(buckets: &[HistogramBucket], price: f64) -> usize {
    buckets
        .iter()
        .position(|b| b.contains(price))
        .unwrap_or(buckets.len() - 1)
}
