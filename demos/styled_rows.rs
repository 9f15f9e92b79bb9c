use xlsx_stream::{Font, RowSource, StreamWriter, StyleRequest, StyleSet, XlsxStreamError};

#[tokio::main]
async fn main() -> Result<(), XlsxStreamError> {
    let styles = StyleSet {
        header: Some(
            StyleRequest::new()
                .fill("2784F5")
                .border(true)
                .font(Font::Heading),
        ),
        even_row: StyleRequest::new().fill("FFFFFF").format("0.00").border(true),
        odd_row: Some(StyleRequest::new().fill("E4E4E6").format("0.00").border(true)),
    };

    let wb = StreamWriter::builder().styles(styles).build()?;
    wb.add_rows([["Name", "Location", "Score"]]).await?;

    let (mut tx, source) = RowSource::channel(64);
    let producer = tokio::spawn(async move {
        for i in 1..1_000 {
            tx.send([
                format!("A{i}").into(),
                "Boston".into(),
                xlsx_stream::CellValue::num(i as f64 / 3.0),
            ])
            .await?;
        }
        Ok::<_, XlsxStreamError>(())
    });

    let n = wb.add_rows(source).await?;
    producer.await??;
    println!("Done sheet : {n} rows");

    wb.save("./example.xlsx").await?;
    Ok(())
}
