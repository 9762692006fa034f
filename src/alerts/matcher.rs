use crate::types::listing::Listing;
use crate::types::saved_search::SearchCriteria;

/// Returns `true` when every criterion that is set holds for `listing`.
pub fn matches(listing: &Listing, criteria: &SearchCriteria) -> bool {
    if let Some(listing_type) = criteria.listing_type
        && listing_type != listing.listing_type
    {
        return false;
    }

    if let Some(district) = criteria.district.as_deref()
        && !districts_overlap(&listing.district, district)
    {
        return false;
    }

    if let Some(min_price) = criteria.min_price
        && listing.price < min_price
    {
        return false;
    }

    if let Some(max_price) = criteria.max_price
        && listing.price > max_price
    {
        return false;
    }

    if let Some(min_bedrooms) = criteria.min_bedrooms
        && listing.bedroom_count < min_bedrooms
    {
        return false;
    }

    if criteria.furnished_required == Some(true) && !listing.furnished {
        return false;
    }

    if criteria.near_campus_required == Some(true) && !listing.near_campus {
        return false;
    }

    true
}

// "Qawmia" and "Al Qawmia, Zagazig" both overlap "Al Qawmia". A listing
// without a district is not filtered by district.
fn districts_overlap(listing_district: &str, wanted: &str) -> bool {
    let listing_district = listing_district.trim().to_lowercase();
    let wanted = wanted.trim().to_lowercase();
    if wanted.is_empty() || listing_district.is_empty() {
        return true;
    }
    listing_district.contains(&wanted) || wanted.contains(&listing_district)
}
