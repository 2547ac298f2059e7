pub mod u501_fetch_from_sienge;
