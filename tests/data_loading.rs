use cryptostat::domain::market::CryptoSymbol;
use cryptostat::infrastructure::CsvPriceLoader;
use std::fs;
use std::path::Path;

const BTC_CSV: &str = "https://www.cryptodatadownload.com
unix,date,symbol,open,high,low,close,Volume BTC,Volume USDT,tradecount
1704240000,2024-01-03 00:00:00,BTC/USDT,45000,45500,42000,42800,1200.5,51000000,900000
1704153600,2024-01-02 00:00:00,BTC/USDT,44100,45900,44000,45000,1500.0,67000000,1100000
1704067200,2024-01-01 00:00:00,BTC/USDT,42200,44200,42100,44100,900.25,39000000,750000
";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_loads_banner_file_in_ascending_order() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "BTC.csv", BTC_CSV);

    let table = CsvPriceLoader::new(dir.path()).load_symbol(CryptoSymbol::Btc).unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(table.closes(), vec![44100.0, 45000.0, 42800.0]);
    let first = &table.bars()[0];
    assert_eq!(first.date.to_string(), "2024-01-01");
    assert_eq!(first.volume, 900.25);
    assert_eq!(first.trade_count, Some(750000.0));
}

#[test]
fn test_missing_and_malformed_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "BTC.csv", BTC_CSV);
    write(dir.path(), "ETH.csv", "date,open,high,low\n2024-01-01,1,2,0.5\n");
    write(
        dir.path(),
        "SOL.csv",
        "date,open,high,low,close\n2024-01-01,1,2,0.5,not-a-price\n",
    );

    let dataset = CsvPriceLoader::new(dir.path()).load_all(&CryptoSymbol::ALL);

    assert_eq!(dataset.symbols(), vec![CryptoSymbol::Btc]);
}

#[test]
fn test_headers_are_case_insensitive_and_tradecount_optional() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "ADA.csv",
        "Date,Open,High,Low,Close,Volume ADA\n2024-02-02,0.5,0.6,0.4,0.55,100\n2024-02-01,0.4,0.5,0.3,0.5,90\n",
    );

    let table = CsvPriceLoader::new(dir.path()).load_symbol(CryptoSymbol::Ada).unwrap();
    assert_eq!(table.closes(), vec![0.5, 0.55]);
    assert!(table.bars().iter().all(|b| b.trade_count.is_none()));
}

#[test]
fn test_duplicate_dates_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "XRP.csv",
        "date,open,high,low,close\n2024-01-01,1,1,1,1\n2024-01-01,1,1,1,1\n",
    );
    assert!(CsvPriceLoader::new(dir.path()).load_symbol(CryptoSymbol::Xrp).is_err());
}
